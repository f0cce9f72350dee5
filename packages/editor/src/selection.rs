use crate::cstree::CsTree;
use abc_parser::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identities that together form one logical selection unit
pub type Cursor = BTreeSet<NodeId>;

/// Zero or more independent cursors over one tree
///
/// Selectors never modify a selection; they return a new one over the same
/// root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub root: NodeId,
    pub cursors: Vec<Cursor>,
}

impl Selection {
    pub fn new(root: NodeId, cursors: Vec<Cursor>) -> Self {
        Self { root, cursors }
    }

    /// One cursor holding the root, so every node is in scope
    pub fn whole(tree: &CsTree) -> Self {
        let root = tree.root_id();
        Self {
            root,
            cursors: vec![Cursor::from([root])],
        }
    }

    /// Build from raw id groups, dropping empty groups
    pub fn from_ids<I, C>(root: NodeId, groups: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = NodeId>,
    {
        let cursors = groups
            .into_iter()
            .map(|group| group.into_iter().collect::<Cursor>())
            .filter(|cursor| !cursor.is_empty())
            .collect();
        Self { root, cursors }
    }

    /// Same root, different cursors
    pub fn with_cursors(&self, cursors: Vec<Cursor>) -> Self {
        Self {
            root: self.root,
            cursors,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Union of all cursors
    pub fn ids(&self) -> BTreeSet<NodeId> {
        self.cursors.iter().flatten().copied().collect()
    }
}
