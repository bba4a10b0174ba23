//! Preference save command handlers

use anyhow::{bail, Context, Result};
use dynamons::{BackupManager, PlayerSetting, SaveSession};

use crate::cli::{SaveAction, SaveArgs};

/// Handle `save <input> [action]`
pub fn handle(args: SaveArgs, backups: BackupManager) -> Result<()> {
    let mut session = SaveSession::new(backups);
    session
        .load(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    match args.action.unwrap_or(SaveAction::Show) {
        SaveAction::Show => {
            print_settings(&session);
            println!();
            print_party(&session);
            println!();
            print_items(&session);
        }
        SaveAction::Party => print_party(&session),
        SaveAction::Items => print_items(&session),
        SaveAction::Settings => print_settings(&session),

        SaveAction::EditParty {
            index,
            name,
            level,
            health,
        } => {
            if name.is_none() && level.is_none() && health.is_none() {
                bail!("Nothing to change; pass --name, --level or --health");
            }
            let party = session.party_mut()?;
            let len = party.len();
            let Some(entry) = party.get_mut(index) else {
                bail!("No party member at index {} (party has {})", index, len);
            };
            if let Some(name) = name {
                entry.name = name;
            }
            if let Some(level) = level {
                entry.level = level;
            }
            if let Some(health) = health {
                entry.health = health;
            }
            println!("{}: {}", index, entry);
            party.validate()?;
            commit(&mut session)?;
        }

        SaveAction::Grant { grants } => {
            for grant in grants {
                session.grant(grant)?;
                println!("Granted {}", grant.segment());
            }
            commit(&mut session)?;
        }

        SaveAction::SetItem { id, segment } => {
            if segment.contains(';') {
                bail!("Segment '{}' must not contain ';'", segment);
            }
            if segment.split(',').next() != Some(id.as_str()) {
                bail!("Segment '{}' does not start with id '{}'", segment, id);
            }
            session.ledger_mut()?.merge([(id, segment)]);
            commit(&mut session)?;
        }

        SaveAction::Set { setting, value } => {
            session.set_setting(setting, value)?;
            commit(&mut session)?;
            print_settings(&session);
        }

        SaveAction::Max => {
            session.max_settings()?;
            commit(&mut session)?;
            print_settings(&session);
        }

        SaveAction::Defaults => {
            session.reset_settings()?;
            commit(&mut session)?;
            print_settings(&session);
        }

        SaveAction::Get { key } => {
            let loaded = session.loaded().context("No save loaded")?;
            let value = loaded
                .document()
                .get(&key)
                .with_context(|| format!("Key not found: {}", key))?;
            println!("{}", value);
        }

        SaveAction::Keys => {
            let loaded = session.loaded().context("No save loaded")?;
            for key in loaded.document().keys() {
                println!("{}", key);
            }
        }
    }

    Ok(())
}

fn commit(session: &mut SaveSession) -> Result<()> {
    session.save().context("Failed to save changes")?;
    if let Some(loaded) = session.loaded() {
        eprintln!("Saved {}", loaded.path().display());
    }
    Ok(())
}

fn print_settings(session: &SaveSession) {
    println!("Settings:");
    for setting in PlayerSetting::ALL {
        let value = session.setting(setting).unwrap_or("(missing)");
        println!("  {:<14} {}", setting.label(), value);
    }
}

fn print_party(session: &SaveSession) {
    let Some(party) = session.party() else {
        println!("Party: (none)");
        return;
    };

    println!("Party ({}):", party.len());
    for (i, entry) in party.iter().enumerate() {
        println!(
            "  [{}] {:<16} lvl {:<4} hp {:<6} {}",
            i, entry.name, entry.level, entry.health, entry
        );
    }
}

fn print_items(session: &SaveSession) {
    let Some(ledger) = session.ledger() else {
        println!("Items: (none)");
        return;
    };

    println!("Items ({}):", ledger.len());
    for (id, segment) in ledger.iter() {
        println!("  {:<24} {}", id, segment);
    }
}
