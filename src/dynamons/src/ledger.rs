//! Item ledger codec.
//!
//! Consumables are stored as `id,count;id,count`. The id is everything before
//! the first comma; the rest of a segment is kept verbatim, so fields this
//! crate does not understand are written back unchanged.

use indexmap::IndexMap;
use thiserror::Error;

const SEGMENT_SEPARATOR: char = ';';
const FIELD_SEPARATOR: char = ',';

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Item segment for {id} contains ';': {segment:?}")]
    SeparatorInSegment { id: String, segment: String },

    #[error("Item segment {segment:?} does not start with id {id}")]
    IdMismatch { id: String, segment: String },
}

/// Id-keyed item segments in save order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemLedger {
    segments: IndexMap<String, String>,
}

impl ItemLedger {
    /// Decode a ledger string.
    ///
    /// A repeated id keeps the position of its first occurrence and the
    /// segment of its last.
    pub fn decode(raw: &str) -> Self {
        let segments = raw
            .split(SEGMENT_SEPARATOR)
            .filter(|s| !s.is_empty())
            .map(|s| (segment_id(s).to_string(), s.to_string()))
            .collect();

        ItemLedger { segments }
    }

    /// Merge `updates` into the ledger.
    ///
    /// Known ids are replaced in place; unknown ids are appended in the order
    /// given. Nothing is ever removed.
    pub fn merge<I, K, V>(&mut self, updates: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (id, segment) in updates {
            self.segments.insert(id.into(), segment.into());
        }
    }

    /// Check every segment would decode back to the same id.
    ///
    /// A segment must not contain `;`, and the text before its first comma
    /// must be the id it is stored under.
    pub fn validate(&self) -> Result<(), LedgerError> {
        for (id, segment) in &self.segments {
            if segment.contains(SEGMENT_SEPARATOR) {
                return Err(LedgerError::SeparatorInSegment {
                    id: id.clone(),
                    segment: segment.clone(),
                });
            }
            if id.is_empty() || segment_id(segment) != id.as_str() {
                return Err(LedgerError::IdMismatch {
                    id: id.clone(),
                    segment: segment.clone(),
                });
            }
        }
        Ok(())
    }

    /// Encode the ledger as `;`-joined segments, without a trailing separator.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.values().enumerate() {
            if i > 0 {
                out.push(SEGMENT_SEPARATOR);
            }
            out.push_str(segment);
        }
        out
    }

    /// Full segment stored for `id`.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.segments.get(id).map(String::as_str)
    }

    /// Text after the id's first comma, usually the item count.
    pub fn count(&self, id: &str) -> Option<&str> {
        self.get(id)
            .and_then(|s| s.split_once(FIELD_SEPARATOR))
            .map(|(_, rest)| rest)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.segments.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// `(id, segment)` pairs in ledger order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.segments
            .iter()
            .map(|(id, segment)| (id.as_str(), segment.as_str()))
    }
}

fn segment_id(segment: &str) -> &str {
    segment
        .split_once(FIELD_SEPARATOR)
        .map_or(segment, |(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_order_and_ids() {
        let ledger = ItemLedger::decode("heal_spray,9999;discatch_special,1;");
        let ids: Vec<&str> = ledger.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["heal_spray", "discatch_special"]);
        assert_eq!(ledger.get("heal_spray"), Some("heal_spray,9999"));
        assert_eq!(ledger.count("discatch_special"), Some("1"));
    }

    #[test]
    fn test_merge_appends_new_id() {
        let mut ledger = ItemLedger::decode("heal_spray,9999;discatch_special,1;");
        ledger.merge([("unlimited_snacks", "unlimited_snacks,1")]);
        assert_eq!(
            ledger.encode(),
            "heal_spray,9999;discatch_special,1;unlimited_snacks,1"
        );
    }

    #[test]
    fn test_merge_replaces_in_place() {
        let mut ledger = ItemLedger::decode("potion,2;heal_spray,3;orb,7");
        ledger.merge([("heal_spray", "heal_spray,9999")]);
        assert_eq!(ledger.encode(), "potion,2;heal_spray,9999;orb,7");
    }

    #[test]
    fn test_merge_leaves_unmentioned_ids() {
        let mut ledger = ItemLedger::decode("a,1;b,2;c,3");
        ledger.merge([("b", "b,20"), ("d", "d,4")]);
        assert_eq!(ledger.get("a"), Some("a,1"));
        assert_eq!(ledger.get("c"), Some("c,3"));
        assert_eq!(ledger.encode(), "a,1;b,20;c,3;d,4");
    }

    #[test]
    fn test_trailing_fields_preserved() {
        let ledger = ItemLedger::decode("egg,1,rare,2024;orb,3");
        assert_eq!(ledger.get("egg"), Some("egg,1,rare,2024"));
        assert_eq!(ledger.count("egg"), Some("1,rare,2024"));
        assert_eq!(ledger.encode(), "egg,1,rare,2024;orb,3");
    }

    #[test]
    fn test_segment_without_comma() {
        let ledger = ItemLedger::decode("flag;orb,3");
        assert_eq!(ledger.get("flag"), Some("flag"));
        assert_eq!(ledger.count("flag"), None);
    }

    #[test]
    fn test_duplicate_id_keeps_first_position() {
        let ledger = ItemLedger::decode("a,1;b,2;a,5");
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.encode(), "a,5;b,2");
    }

    #[test]
    fn test_validate_rejects_split_segments() {
        let mut ledger = ItemLedger::decode("potion,2;orb,7");
        assert_eq!(ledger.validate(), Ok(()));

        ledger.merge([("potion", "potion,2;orb,99")]);
        assert_eq!(
            ledger.validate(),
            Err(LedgerError::SeparatorInSegment {
                id: "potion".to_string(),
                segment: "potion,2;orb,99".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_rejects_foreign_id() {
        let mut ledger = ItemLedger::decode("potion,2");
        ledger.merge([("orb", "potion,5")]);
        assert!(matches!(
            ledger.validate(),
            Err(LedgerError::IdMismatch { id, .. }) if id == "orb"
        ));

        let mut ledger = ItemLedger::default();
        ledger.merge([("", "")]);
        assert!(ledger.validate().is_err());
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = ItemLedger::decode("");
        assert!(ledger.is_empty());
        assert_eq!(ledger.encode(), "");
    }
}
