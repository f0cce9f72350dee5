use abc_editor::CsTree;
use abc_parser::ast::File;
use abc_parser::{parse, IdGenerator, NodeId};
use std::collections::HashMap;
use std::sync::Arc;

/// One open document and its latest parse
#[derive(Debug, Clone)]
pub struct OpenDocument {
    pub uri: String,
    pub text: String,
    pub version: u64,
    pub file: File,
    pub ids: IdGenerator,
}

impl OpenDocument {
    fn parse(uri: String, text: String, version: u64) -> Self {
        let output = parse(&text);
        if !output.errors.is_empty() {
            tracing::debug!("[State] {} has {} diagnostic(s)", uri, output.errors.len());
        }
        Self {
            uri,
            text,
            version,
            file: output.file,
            ids: output.ids,
        }
    }

    /// Identity of the AST root, the key of the tree cache
    pub fn root_id(&self) -> NodeId {
        self.file.id
    }
}

/// Open documents plus a tree cache keyed by AST root identity
///
/// A tree is built the first time a document is queried after a parse. When
/// a document is re-parsed or closed its cached tree is dropped.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<String, OpenDocument>,
    trees: HashMap<NodeId, Arc<CsTree>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document, or replace the text of an open one
    ///
    /// Returns the new version: 0 on first open, then one more per update.
    pub fn open(&mut self, uri: &str, text: String) -> u64 {
        let version = match self.documents.get(uri) {
            Some(previous) => {
                self.trees.remove(&previous.root_id());
                previous.version + 1
            }
            None => 0,
        };
        let document = OpenDocument::parse(uri.to_string(), text, version);
        tracing::debug!("[State] {} at version {}", uri, version);
        self.documents.insert(uri.to_string(), document);
        version
    }

    pub fn close(&mut self, uri: &str) -> bool {
        match self.documents.remove(uri) {
            Some(document) => {
                self.trees.remove(&document.root_id());
                true
            }
            None => false,
        }
    }

    pub fn get(&self, uri: &str) -> Option<&OpenDocument> {
        self.documents.get(uri)
    }

    pub fn cached_tree(&self, root: NodeId) -> Option<Arc<CsTree>> {
        self.trees.get(&root).cloned()
    }

    /// Cached tree for the document's current AST, built on first use
    pub fn tree_for(&mut self, uri: &str) -> Option<Arc<CsTree>> {
        let document = self.documents.get(uri)?;
        let tree = self
            .trees
            .entry(document.root_id())
            .or_insert_with(|| Arc::new(CsTree::from_file(&document.file)));
        Some(Arc::clone(tree))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn cached_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "file:///tunes/reel.abc";

    #[test]
    fn test_reopen_bumps_version() {
        let mut store = DocumentStore::new();
        assert_eq!(store.open(URI, "X:1\nK:C\nC\n".to_string()), 0);
        assert_eq!(store.open(URI, "X:1\nK:C\nD\n".to_string()), 1);
        assert_eq!(store.get(URI).unwrap().text, "X:1\nK:C\nD\n");
        assert_eq!(store.open("file:///other.abc", String::new()), 0);
    }

    #[test]
    fn test_tree_cache_follows_current_ast() {
        let mut store = DocumentStore::new();
        store.open(URI, "X:1\nK:C\nC\n".to_string());

        let first = store.tree_for(URI).unwrap();
        let again = store.tree_for(URI).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(store.cached_trees(), 1);

        store.open(URI, "X:1\nK:C\nD\n".to_string());
        assert_eq!(store.cached_trees(), 0);
        assert!(store.cached_tree(first.root_id()).is_none());

        let fresh = store.tree_for(URI).unwrap();
        assert!(!Arc::ptr_eq(&first, &fresh));
    }

    #[test]
    fn test_close_drops_tree() {
        let mut store = DocumentStore::new();
        store.open(URI, "X:1\nK:C\nC\n".to_string());
        store.tree_for(URI);
        assert!(store.close(URI));
        assert!(!store.close(URI));
        assert!(store.is_empty());
        assert_eq!(store.cached_trees(), 0);
    }
}
