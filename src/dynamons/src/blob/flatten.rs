//! Flattened row view of a blob tree.
//!
//! Editors display a blob as rows: one per nested object and one per leaf, in
//! depth-first key order. [`BlobNode::flatten`] and [`BlobNode::unflatten`]
//! convert between the two forms; the tree stays authoritative and rows are
//! only a projection of it.

use super::{coerce_leaf, join_path, BlobError, BlobNode, BlobValue};

/// What a row holds.
#[derive(Debug, Clone, PartialEq)]
pub enum RowKind {
    /// A nested object; its contents follow as separate rows.
    Branch,
    Leaf(BlobValue),
}

/// One row of the flattened view.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    pub path: Vec<String>,
    pub kind: RowKind,
}

impl FlatRow {
    pub fn key(&self) -> &str {
        self.path.last().map_or("", String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Text shown in the value column; empty for branches.
    pub fn display(&self) -> String {
        match &self.kind {
            RowKind::Branch => String::new(),
            RowKind::Leaf(value) => value.to_string(),
        }
    }

    /// Replace a leaf with the coerced form of `text`.
    pub fn set_text(&mut self, text: &str) -> Result<(), BlobError> {
        if matches!(self.kind, RowKind::Branch) {
            return Err(BlobError::NotALeaf(join_path(&self.path)));
        }
        self.kind = RowKind::Leaf(coerce_leaf(text));
        Ok(())
    }
}

impl BlobNode {
    /// Rows in depth-first insertion order.
    pub fn flatten(&self) -> Vec<FlatRow> {
        let mut rows = Vec::new();
        flatten_into(self, &mut Vec::new(), &mut rows);
        rows
    }

    /// Rebuild a tree from rows.
    ///
    /// Missing parent objects are created on demand, so a leaf row may appear
    /// without its branch row. A row that would nest under a leaf fails with
    /// [`BlobError::NotABranch`].
    pub fn unflatten<'a, I>(rows: I) -> Result<BlobNode, BlobError>
    where
        I: IntoIterator<Item = &'a FlatRow>,
    {
        let mut root = BlobNode::new();

        for row in rows {
            let Some((last, parents)) = row.path.split_last() else {
                continue;
            };
            let parent = branch_mut(&mut root, parents, &row.path)?;

            match &row.kind {
                RowKind::Branch => {
                    if !parent.entries.contains_key(last) {
                        parent.insert(last.clone(), BlobValue::Node(BlobNode::new()));
                    } else if !matches!(parent.entries.get(last), Some(BlobValue::Node(_))) {
                        return Err(BlobError::NotABranch(join_path(&row.path)));
                    }
                }
                RowKind::Leaf(value) => {
                    parent.insert(last.clone(), value.clone());
                }
            }
        }

        Ok(root)
    }
}

fn flatten_into(node: &BlobNode, prefix: &mut Vec<String>, rows: &mut Vec<FlatRow>) {
    for (key, value) in node.iter() {
        prefix.push(key.clone());
        match value {
            BlobValue::Node(child) => {
                rows.push(FlatRow {
                    path: prefix.clone(),
                    kind: RowKind::Branch,
                });
                flatten_into(child, prefix, rows);
            }
            leaf => rows.push(FlatRow {
                path: prefix.clone(),
                kind: RowKind::Leaf(leaf.clone()),
            }),
        }
        prefix.pop();
    }
}

fn branch_mut<'n>(
    root: &'n mut BlobNode,
    parents: &[String],
    full: &[String],
) -> Result<&'n mut BlobNode, BlobError> {
    let mut node = root;
    for key in parents {
        let child = node
            .entries
            .entry(key.clone())
            .or_insert_with(|| BlobValue::Node(BlobNode::new()));
        node = match child {
            BlobValue::Node(child) => child,
            _ => return Err(BlobError::NotABranch(join_path(full))),
        };
    }
    Ok(node)
}
