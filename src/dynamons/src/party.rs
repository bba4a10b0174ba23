//! Party roster codec.
//!
//! The party lives in a single preference string: one record per creature,
//! eight comma-separated fields per record, every record terminated by `;`.
//!
//! ```text
//! Sparky,3,50,0,0,10,0,1;Pyro,5,80,1,0,20,0,2;
//! ```
//!
//! Only `name`, `level` and `health` have a known meaning. Every field is kept
//! as opaque text so unknown values survive a round trip untouched.

use std::fmt;
use thiserror::Error;

/// Number of fields in a party record.
pub const FIELD_COUNT: usize = 8;

const RECORD_SEPARATOR: char = ';';
const FIELD_SEPARATOR: char = ',';

const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "name", "level", "health", "unknown1", "unknown2", "value1", "unknown3", "value2",
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PartyError {
    #[error("Malformed party record {index}: expected 8 fields, found {fields} in {segment:?}")]
    MalformedRecord {
        index: usize,
        fields: usize,
        segment: String,
    },

    #[error("Party record {index} field {field} contains a separator: {value:?}")]
    SeparatorInField {
        index: usize,
        field: &'static str,
        value: String,
    },
}

/// One creature in the party.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartyEntry {
    pub name: String,
    pub level: String,
    pub health: String,
    pub unknown1: String,
    pub unknown2: String,
    pub value1: String,
    pub unknown3: String,
    pub value2: String,
}

impl PartyEntry {
    /// Build an entry from exactly [`FIELD_COUNT`] fields.
    fn from_fields(fields: [&str; FIELD_COUNT]) -> Self {
        let [name, level, health, unknown1, unknown2, value1, unknown3, value2] =
            fields.map(str::to_string);
        PartyEntry {
            name,
            level,
            health,
            unknown1,
            unknown2,
            value1,
            unknown3,
            value2,
        }
    }

    /// Fields in wire order.
    pub fn fields(&self) -> [&str; FIELD_COUNT] {
        [
            &self.name,
            &self.level,
            &self.health,
            &self.unknown1,
            &self.unknown2,
            &self.value1,
            &self.unknown3,
            &self.value2,
        ]
    }
}

impl fmt::Display for PartyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields().iter().enumerate() {
            if i > 0 {
                write!(f, "{}", FIELD_SEPARATOR)?;
            }
            f.write_str(field)?;
        }
        Ok(())
    }
}

/// Ordered party records, in the order they appear in the save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartyRoster {
    entries: Vec<PartyEntry>,
}

impl PartyRoster {
    pub fn new(entries: Vec<PartyEntry>) -> Self {
        PartyRoster { entries }
    }

    /// Decode a party string.
    ///
    /// Empty segments are ignored and segments with fewer than eight fields
    /// are dropped. A segment with more than eight fields is rejected with
    /// [`PartyError::MalformedRecord`]; `index` counts non-empty segments.
    pub fn decode(raw: &str) -> Result<Self, PartyError> {
        let mut entries = Vec::new();

        for (index, segment) in raw
            .trim()
            .split(RECORD_SEPARATOR)
            .filter(|s| !s.is_empty())
            .enumerate()
        {
            let fields: Vec<&str> = segment.split(FIELD_SEPARATOR).collect();
            match <[&str; FIELD_COUNT]>::try_from(fields.as_slice()) {
                Ok(fields) => entries.push(PartyEntry::from_fields(fields)),
                Err(_) if fields.len() < FIELD_COUNT => {
                    tracing::debug!(index, fields = fields.len(), "dropping short party record");
                }
                Err(_) => {
                    return Err(PartyError::MalformedRecord {
                        index,
                        fields: fields.len(),
                        segment: segment.to_string(),
                    });
                }
            }
        }

        Ok(PartyRoster { entries })
    }

    /// Encode the roster; every record is followed by `;`, and an empty
    /// roster encodes to a lone `;`.
    ///
    /// Fields are written as they are. Call [`PartyRoster::validate`] first
    /// when they may have been edited.
    pub fn encode(&self) -> String {
        if self.entries.is_empty() {
            return RECORD_SEPARATOR.to_string();
        }

        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.to_string());
            out.push(RECORD_SEPARATOR);
        }
        out
    }

    /// Check that no field contains `,` or `;`, which would change the
    /// record layout once encoded.
    pub fn validate(&self) -> Result<(), PartyError> {
        for (index, entry) in self.entries.iter().enumerate() {
            let bad = entry
                .fields()
                .into_iter()
                .zip(FIELD_NAMES)
                .find(|(value, _)| value.contains([FIELD_SEPARATOR, RECORD_SEPARATOR]));

            if let Some((value, field)) = bad {
                return Err(PartyError::SeparatorInField {
                    index,
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PartyEntry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut PartyEntry> {
        self.entries.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PartyEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, PartyEntry> {
        self.entries.iter_mut()
    }
}

impl<'a> IntoIterator for &'a PartyRoster {
    type Item = &'a PartyEntry;
    type IntoIter = std::slice::Iter<'a, PartyEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO: &str = "Sparky,3,50,0,0,10,0,1;Pyro,5,80,1,0,20,0,2;";

    #[test]
    fn test_decode_example() {
        let roster = PartyRoster::decode(TWO).unwrap();
        assert_eq!(roster.len(), 2);

        let sparky = roster.get(0).unwrap();
        assert_eq!(sparky.name, "Sparky");
        assert_eq!(sparky.level, "3");
        assert_eq!(sparky.health, "50");
        assert_eq!(sparky.value1, "10");
        assert_eq!(sparky.value2, "1");

        let pyro = roster.get(1).unwrap();
        assert_eq!(pyro.name, "Pyro");
        assert_eq!(pyro.level, "5");
        assert_eq!(pyro.health, "80");
        assert_eq!(pyro.unknown1, "1");
    }

    #[test]
    fn test_encode_reproduces_input() {
        let roster = PartyRoster::decode(TWO).unwrap();
        assert_eq!(roster.encode(), TWO);
    }

    #[test]
    fn test_roster_roundtrip() {
        let mut roster = PartyRoster::decode(TWO).unwrap();
        roster.get_mut(1).unwrap().level = "99".to_string();

        let decoded = PartyRoster::decode(&roster.encode()).unwrap();
        assert_eq!(decoded, roster);
    }

    #[test]
    fn test_empty_roster_encodes_to_separator() {
        let roster = PartyRoster::default();
        assert_eq!(roster.encode(), ";");
        assert!(PartyRoster::decode(";").unwrap().is_empty());
        assert!(PartyRoster::decode("").unwrap().is_empty());
    }

    #[test]
    fn test_validate_rejects_separators() {
        let mut roster = PartyRoster::decode(TWO).unwrap();
        assert_eq!(roster.validate(), Ok(()));

        roster.get_mut(0).unwrap().name = "Mr,Sparky".to_string();
        assert_eq!(
            roster.validate(),
            Err(PartyError::SeparatorInField {
                index: 0,
                field: "name",
                value: "Mr,Sparky".to_string(),
            })
        );

        roster.get_mut(0).unwrap().name = "Sparky".to_string();
        roster.get_mut(1).unwrap().health = "80;".to_string();
        assert!(matches!(
            roster.validate(),
            Err(PartyError::SeparatorInField { index: 1, field: "health", .. })
        ));
    }

    #[test]
    fn test_short_segment_dropped() {
        let raw = "Sparky,3,50,0,0,10,0;Pyro,5,80,1,0,20,0,2;";
        let roster = PartyRoster::decode(raw).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.get(0).unwrap().name, "Pyro");
    }

    #[test]
    fn test_long_segment_rejected() {
        let raw = "Sparky,3,50,0,0,10,0,1;Pyro,5,80,1,0,20,0,2,7;";
        let err = PartyRoster::decode(raw).unwrap_err();
        assert_eq!(
            err,
            PartyError::MalformedRecord {
                index: 1,
                fields: 9,
                segment: "Pyro,5,80,1,0,20,0,2,7".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_segments_ignored() {
        let raw = ";;Sparky,3,50,0,0,10,0,1;;Pyro,5,80,1,0,20,0,2";
        let roster = PartyRoster::decode(raw).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.encode(), TWO);
    }

    #[test]
    fn test_opaque_fields_preserved() {
        let raw = "Zap,07,1e3,-1,,x y,0.50,abc;";
        let roster = PartyRoster::decode(raw).unwrap();
        let entry = roster.get(0).unwrap();
        assert_eq!(entry.level, "07");
        assert_eq!(entry.health, "1e3");
        assert_eq!(entry.unknown2, "");
        assert_eq!(roster.encode(), raw);
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let roster = PartyRoster::decode("\n    Sparky,3,50,0,0,10,0,1;\n").unwrap();
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_entry_display() {
        let roster = PartyRoster::decode(TWO).unwrap();
        assert_eq!(roster.get(0).unwrap().to_string(), "Sparky,3,50,0,0,10,0,1");
    }
}
