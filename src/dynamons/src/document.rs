//! Preference document access.
//!
//! Dynamons World persists its state through Android `SharedPreferences`, an
//! XML file shaped like:
//!
//! ```xml
//! <?xml version='1.0' encoding='utf-8' standalone='yes' ?>
//! <map>
//!     <string name="dynamons_worldPLAYER_COINS">9185</string>
//!     <int name="some_counter" value="3" />
//! </map>
//! ```
//!
//! Only `<string>` entries are addressable. The document keeps the original
//! text and splices edited values back into it, so everything that was not
//! rewritten through [`SaveDocument::set`] is serialized byte-for-byte.

use std::ops::Range;
use thiserror::Error;

/// Declaration written by Android when the source document carried none.
pub const DEFAULT_DECLARATION: &str = "<?xml version='1.0' encoding='utf-8' standalone='yes' ?>";

const ENTRY_TAG: &str = "string";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Malformed preference document: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("Preference document is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Value for {key} contains a character XML cannot hold: {ch:?}")]
    IllegalCharacter { key: String, ch: char },
}

/// Where an entry's value lives in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    /// Bytes between the start and end tag.
    Content(Range<usize>),
    /// `<string name="..." />`, with the offset where the start tag's `/>` begins.
    SelfClosing { element: Range<usize>, open_end: usize },
}

impl Slot {
    fn start(&self) -> usize {
        match self {
            Slot::Content(range) => range.start,
            Slot::SelfClosing { element, .. } => element.start,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    value: String,
    slot: Slot,
    edited: bool,
}

/// A loaded preference document.
#[derive(Debug, Clone)]
pub struct SaveDocument {
    source: String,
    entries: Vec<Entry>,
}

impl SaveDocument {
    /// Parse a preference document.
    pub fn load(bytes: &[u8]) -> Result<Self, DocumentError> {
        let source = std::str::from_utf8(bytes)?.to_owned();

        let entries = {
            let doc = roxmltree::Document::parse(&source)?;
            doc.descendants()
                .filter(|n| n.has_tag_name(ENTRY_TAG))
                .filter_map(|n| entry_from_node(&source, n))
                .collect()
        };

        Ok(SaveDocument { source, entries })
    }

    /// Value of the first entry named `key`, in document order.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// Rewrite the value of the first entry named `key`.
    ///
    /// Returns [`DocumentError::KeyNotFound`] without touching the document
    /// when no entry matches; callers decide whether that is fatal. Control
    /// characters other than tab, newline and carriage return are rejected
    /// with [`DocumentError::IllegalCharacter`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), DocumentError> {
        if let Some(ch) = value.chars().find(|&c| !is_xml_char(c)) {
            return Err(DocumentError::IllegalCharacter {
                key: key.to_string(),
                ch,
            });
        }

        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.key == key)
            .ok_or_else(|| DocumentError::KeyNotFound(key.to_string()))?;

        entry.value = value.to_string();
        entry.edited = true;
        Ok(())
    }

    /// Whether an entry named `key` exists.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Entry keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    /// `(key, value)` pairs in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.key.as_str(), e.value.as_str()))
    }

    /// Whether any entry has been rewritten since load.
    pub fn is_modified(&self) -> bool {
        self.entries.iter().any(|e| e.edited)
    }

    /// Serialize the document, splicing rewritten values into the original text.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = String::with_capacity(self.source.len() + DEFAULT_DECLARATION.len() + 1);

        if !has_declaration(&self.source) {
            out.push_str(DEFAULT_DECLARATION);
            out.push('\n');
        }

        let mut cursor = 0;
        for entry in self.entries.iter().filter(|e| e.edited) {
            // Nested <string> elements can overlap an earlier splice.
            if entry.slot.start() < cursor {
                continue;
            }

            let escaped = escape_text(&entry.value);
            match &entry.slot {
                Slot::Content(range) => {
                    out.push_str(&self.source[cursor..range.start]);
                    out.push_str(&escaped);
                    cursor = range.end;
                }
                Slot::SelfClosing { element, open_end } => {
                    out.push_str(&self.source[cursor..element.start]);
                    out.push_str(&self.source[element.start..*open_end]);
                    out.push('>');
                    out.push_str(&escaped);
                    out.push_str("</");
                    out.push_str(ENTRY_TAG);
                    out.push('>');
                    cursor = element.end;
                }
            }
        }
        out.push_str(&self.source[cursor..]);

        out.into_bytes()
    }
}

fn entry_from_node(source: &str, node: roxmltree::Node<'_, '_>) -> Option<Entry> {
    let key = node.attribute("name")?.to_string();
    let value = node
        .children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect();

    let range = node.range();
    let element = &source[range.clone()];
    let open_len = start_tag_len(element)?;

    let slot = if open_len == element.len() {
        let open_end = range.start + element[..open_len - 2].trim_end().len();
        Slot::SelfClosing {
            element: range,
            open_end,
        }
    } else {
        let close = element.rfind("</")?;
        Slot::Content(range.start + open_len..range.start + close)
    };

    Some(Entry {
        key,
        value,
        slot,
        edited: false,
    })
}

/// Length of the start tag at the beginning of `element`, including its `>`.
fn start_tag_len(element: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in element.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return Some(i + 1),
            _ => {}
        }
    }
    None
}

fn has_declaration(source: &str) -> bool {
    source
        .trim_start_matches('\u{feff}')
        .trim_start()
        .starts_with("<?xml")
}

/// Characters allowed in XML 1.0 content.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{d7ff}' | '\u{e000}'..='\u{fffd}' | '\u{10000}'..='\u{10ffff}'
    )
}

fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            // A raw CR would be normalized to LF on the next load
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    out
}
