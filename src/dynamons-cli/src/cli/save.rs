//! Save command CLI definitions

use clap::{Args, Subcommand};
use dynamons::{ItemGrant, PlayerSetting};
use std::path::PathBuf;

#[derive(Args)]
pub struct SaveArgs {
    /// Path to the preference XML (e.g. MainActivity.xml)
    pub input: PathBuf,

    #[command(subcommand)]
    pub action: Option<SaveAction>,
}

#[derive(Subcommand)]
pub enum SaveAction {
    /// Show settings, party and items
    Show,

    /// List the party
    Party,

    /// Edit a party member's name, level or health
    EditParty {
        /// Zero-based position in the party
        index: usize,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        level: Option<String>,

        #[arg(long)]
        health: Option<String>,
    },

    /// List the item ledger
    Items,

    /// Unlock preset items (heal-spray, discatch-special, unlimited-snacks)
    Grant {
        #[arg(required = true)]
        grants: Vec<ItemGrant>,
    },

    /// Replace or append a raw ledger segment
    SetItem {
        /// Item id (text before the first comma)
        id: String,

        /// Full segment, e.g. "potion,20"
        segment: String,
    },

    /// Show player settings
    Settings,

    /// Set a player setting (coins, dust, pvp-xp, trophies, battle-speed)
    Set {
        setting: PlayerSetting,
        value: String,
    },

    /// Set every player setting to its maximum preset
    Max,

    /// Reset every player setting to a fresh save's value
    Defaults,

    /// Print the raw value of any string entry
    Get {
        key: String,
    },

    /// List all string entry keys
    Keys,
}
