//! # dynamons
//!
//! Dynamons World save editor library.
//!
//! This library provides functionality to:
//! - Read and rewrite the game's XML preference document without disturbing
//!   entries it does not touch
//! - Decode and encode the party roster and the item ledger
//! - Decode and encode the base64+JSON blob saves of the alternate variant
//! - Keep timestamped backups and roll back failed saves
//!
//! ## Example
//!
//! ```no_run
//! use dynamons::{BackupManager, ItemGrant, PlayerSetting, SaveSession};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = SaveSession::new(BackupManager::new("save_backups"));
//! session.load("MainActivity.xml")?;
//!
//! if let Some(first) = session.party_mut()?.get_mut(0) {
//!     first.level = "60".to_string();
//! }
//! session.grant(ItemGrant::HealSpray)?;
//! session.set_setting(PlayerSetting::Coins, "999999")?;
//!
//! session.save()?;
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod blob;
pub mod document;
pub mod keys;
pub mod ledger;
pub mod party;
pub mod session;

// Re-export commonly used items
#[doc(inline)]
pub use backup::{Backup, BackupError, BackupManager};
#[doc(inline)]
pub use blob::{coerce_leaf, BlobError, BlobNode, BlobValue};
#[doc(inline)]
pub use document::{DocumentError, SaveDocument};
#[doc(inline)]
pub use keys::{ItemGrant, PlayerSetting, ITEMS_KEY, PARTY_KEY};
#[doc(inline)]
pub use ledger::{ItemLedger, LedgerError};
#[doc(inline)]
pub use party::{PartyEntry, PartyError, PartyRoster};
#[doc(inline)]
pub use session::{
    AtomicFileWriter, LoadedSave, RestoreOutcome, SaveSession, SaveWriter, SessionError,
    SessionState,
};
