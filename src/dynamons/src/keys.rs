//! Well-known preference keys and editing presets.

use std::fmt;
use std::str::FromStr;

/// Preference key holding the party roster.
pub const PARTY_KEY: &str = "dynamons_worldMONS_DATA";

/// Preference key holding the item ledger.
pub const ITEMS_KEY: &str = "dynamons_worldITEMS_DATA";

/// Scalar player settings. Values are opaque strings in the save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerSetting {
    Coins,
    Dust,
    PvpXp,
    Trophies,
    BattleSpeed,
}

impl PlayerSetting {
    pub const ALL: [PlayerSetting; 5] = [
        PlayerSetting::Coins,
        PlayerSetting::Dust,
        PlayerSetting::PvpXp,
        PlayerSetting::Trophies,
        PlayerSetting::BattleSpeed,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PlayerSetting::Coins => "dynamons_worldPLAYER_COINS",
            PlayerSetting::Dust => "dynamons_worldPLAYER_DUST",
            PlayerSetting::PvpXp => "dynamons_worldPVP_LEAGUE_XP",
            PlayerSetting::Trophies => "dynamons_worldPROF_TROPHIES",
            PlayerSetting::BattleSpeed => "dynamons_worldPREFER_TIME_SCALE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayerSetting::Coins => "Coins",
            PlayerSetting::Dust => "Dust",
            PlayerSetting::PvpXp => "PVP XP",
            PlayerSetting::Trophies => "Trophies",
            PlayerSetting::BattleSpeed => "Battle Speed",
        }
    }

    /// Value a fresh save starts with.
    pub fn default_value(self) -> &'static str {
        match self {
            PlayerSetting::Coins => "9185",
            PlayerSetting::Dust => "74910",
            PlayerSetting::PvpXp => "50",
            PlayerSetting::Trophies => "10",
            PlayerSetting::BattleSpeed => "8",
        }
    }

    /// Value written by "max all".
    pub fn max_value(self) -> &'static str {
        match self {
            PlayerSetting::Coins => "999999",
            _ => "9999",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }
}

impl fmt::Display for PlayerSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PlayerSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace(['-', '_', ' '], "");
        match normalized.as_str() {
            "coins" => Ok(PlayerSetting::Coins),
            "dust" => Ok(PlayerSetting::Dust),
            "pvpxp" => Ok(PlayerSetting::PvpXp),
            "trophies" => Ok(PlayerSetting::Trophies),
            "battlespeed" | "timescale" => Ok(PlayerSetting::BattleSpeed),
            _ => Self::from_key(s).ok_or_else(|| format!("unknown setting: {}", s)),
        }
    }
}

/// Item unlocks merged into the ledger on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemGrant {
    HealSpray,
    DiscatchSpecial,
    UnlimitedSnacks,
}

impl ItemGrant {
    pub const ALL: [ItemGrant; 3] = [
        ItemGrant::HealSpray,
        ItemGrant::DiscatchSpecial,
        ItemGrant::UnlimitedSnacks,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ItemGrant::HealSpray => "heal_spray",
            ItemGrant::DiscatchSpecial => "discatch_special",
            ItemGrant::UnlimitedSnacks => "unlimited_snacks",
        }
    }

    pub fn count(self) -> &'static str {
        match self {
            ItemGrant::HealSpray => "9999",
            ItemGrant::DiscatchSpecial | ItemGrant::UnlimitedSnacks => "1",
        }
    }

    /// Ledger segment written for this grant.
    pub fn segment(self) -> String {
        format!("{},{}", self.id(), self.count())
    }

    /// `(id, segment)` pair for [`crate::ItemLedger::merge`].
    pub fn update(self) -> (&'static str, String) {
        (self.id(), self.segment())
    }
}

impl FromStr for ItemGrant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|g| g.id() == normalized)
            .ok_or_else(|| format!("unknown item grant: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_keys_unique() {
        let mut keys: Vec<&str> = PlayerSetting::ALL.iter().map(|s| s.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), PlayerSetting::ALL.len());
    }

    #[test]
    fn test_max_values() {
        assert_eq!(PlayerSetting::Coins.max_value(), "999999");
        assert_eq!(PlayerSetting::Trophies.max_value(), "9999");
    }

    #[test]
    fn test_setting_from_str() {
        assert_eq!("coins".parse::<PlayerSetting>(), Ok(PlayerSetting::Coins));
        assert_eq!("pvp-xp".parse::<PlayerSetting>(), Ok(PlayerSetting::PvpXp));
        assert_eq!("Battle Speed".parse::<PlayerSetting>(), Ok(PlayerSetting::BattleSpeed));
        assert_eq!(
            "dynamons_worldPROF_TROPHIES".parse::<PlayerSetting>(),
            Ok(PlayerSetting::Trophies)
        );
        assert!("gems".parse::<PlayerSetting>().is_err());
    }

    #[test]
    fn test_item_grant_segments() {
        assert_eq!(ItemGrant::HealSpray.segment(), "heal_spray,9999");
        assert_eq!(ItemGrant::DiscatchSpecial.segment(), "discatch_special,1");
        assert_eq!(
            ItemGrant::UnlimitedSnacks.update(),
            ("unlimited_snacks", "unlimited_snacks,1".to_string())
        );
    }

    #[test]
    fn test_item_grant_from_str() {
        assert_eq!("heal-spray".parse::<ItemGrant>(), Ok(ItemGrant::HealSpray));
        assert_eq!("UNLIMITED_SNACKS".parse::<ItemGrant>(), Ok(ItemGrant::UnlimitedSnacks));
        assert!("golden_egg".parse::<ItemGrant>().is_err());
    }
}
