//! Request dispatch
//!
//! Every request is validated (URI shape, registry membership, argument
//! kinds) before any tree operation runs. Transforms run on a copy of the
//! cached tree; the store only changes through `openDocument`.

use crate::config::Config;
use crate::protocol::*;
use crate::registry::{lookup_selector, lookup_transform};
use crate::state::{DocumentStore, OpenDocument};
use abc_editor::selectors::select_ranges;
use abc_editor::{
    cursor_ranges, CsTree, EditPipeline, EditorError, NodeId, Range, Selection, TransformError,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

pub type SharedStore = Arc<RwLock<DocumentStore>>;

#[derive(Clone)]
pub struct Handlers {
    store: SharedStore,
    config: Arc<Config>,
}

impl Handlers {
    pub fn new(store: SharedStore, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Handle one raw request line and produce the response to send back
    pub fn handle_line(&self, line: &str) -> Response {
        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                let error = ProtocolError::invalid_request(format!("Malformed request: {}", e));
                return Response::err(Value::Null, &error);
            }
        };
        tracing::debug!("[Handlers] {} (id {})", request.method, request.id);

        match self.dispatch(&request.method, request.params) {
            Ok(result) => Response::ok(request.id, result),
            Err(error) => {
                tracing::debug!("[Handlers] {} failed: {}", request.method, error);
                Response::err(request.id, &error)
            }
        }
    }

    pub fn dispatch(&self, method: &str, params: Value) -> ProtocolResult<Value> {
        match method {
            APPLY_SELECTOR | EDITOR_APPLY_SELECTOR => {
                to_value(self.apply_selector(from_params(params)?)?)
            }
            APPLY_TRANSFORM | EDITOR_APPLY_TRANSFORM => {
                to_value(self.apply_transform(from_params(params)?)?)
            }
            OPEN_DOCUMENT => to_value(self.open_document(from_params(params)?)?),
            CLOSE_DOCUMENT => {
                let params: CloseParams = from_params(params)?;
                validate_uri(&params.uri, &self.config.file_extensions)?;
                let closed = self.write_store().close(&params.uri);
                Ok(Value::Bool(closed))
            }
            other => Err(ProtocolError::new(
                ErrorCode::UnknownMethod,
                format!("Unknown method: {}", other),
            )),
        }
    }

    pub fn open_document(&self, params: OpenParams) -> ProtocolResult<OpenResult> {
        validate_uri(&params.uri, &self.config.file_extensions)?;
        let version = self.write_store().open(&params.uri, params.text);
        Ok(OpenResult { version })
    }

    pub fn apply_selector(&self, params: SelectorParams) -> ProtocolResult<SelectorResult> {
        validate_uri(&params.uri, &self.config.file_extensions)?;
        let entry = lookup_selector(&params.selector).ok_or_else(|| {
            ProtocolError::invalid_params(format!("Unknown selector: {}", params.selector))
        })?;

        let (_, tree) = self.document_tree(&params.uri)?;
        let start = initial_selection(&tree, params.cursor_node_ids, params.ranges.as_deref());
        let selected = entry.apply(&tree, &start, &params.args)?;

        Ok(SelectorResult {
            ranges: cursor_ranges(&tree, &selected),
            cursor_node_ids: selected
                .cursors
                .iter()
                .map(|cursor| cursor.iter().copied().collect())
                .collect(),
        })
    }

    pub fn apply_transform(&self, params: TransformParams) -> ProtocolResult<TransformResult> {
        validate_uri(&params.uri, &self.config.file_extensions)?;
        let entry = lookup_transform(&params.transform).ok_or_else(|| {
            ProtocolError::invalid_params(format!("Unknown transform: {}", params.transform))
        })?;
        let transform = entry.transform(&params.args)?;

        let (document, cached) = self.document_tree(&params.uri)?;
        let selection = initial_selection(&cached, params.cursor_node_ids, params.ranges.as_deref());

        let mut tree = CsTree::clone(&cached);
        let mut pipeline = EditPipeline::new(document.ids.clone());
        let outcome = pipeline
            .apply(&document.text, &mut tree, &selection, &transform)
            .map_err(editor_error)?;

        Ok(TransformResult {
            new_text: outcome.new_text,
            text_edits: outcome.edits,
            cursor_ranges: outcome.cursor_ranges,
        })
    }

    /// The open document and the tree of its current AST
    ///
    /// Cache hits only take the read lock; a miss builds the tree under the
    /// write lock.
    fn document_tree(&self, uri: &str) -> ProtocolResult<(OpenDocument, Arc<CsTree>)> {
        {
            let store = self.read_store();
            let document = store
                .get(uri)
                .ok_or_else(|| ProtocolError::document_not_found(uri))?;
            if let Some(tree) = store.cached_tree(document.root_id()) {
                return Ok((document.clone(), tree));
            }
        }

        let mut store = self.write_store();
        let tree = store
            .tree_for(uri)
            .ok_or_else(|| ProtocolError::document_not_found(uri))?;
        let document = store
            .get(uri)
            .cloned()
            .ok_or_else(|| ProtocolError::document_not_found(uri))?;
        Ok((document, tree))
    }

    fn read_store(&self) -> std::sync::RwLockReadGuard<'_, DocumentStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_store(&self) -> std::sync::RwLockWriteGuard<'_, DocumentStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cursor ids if given, else editor ranges, else the whole document
fn initial_selection(
    tree: &CsTree,
    cursor_node_ids: Option<Vec<Vec<NodeId>>>,
    ranges: Option<&[Range]>,
) -> Selection {
    match (cursor_node_ids, ranges) {
        (Some(ids), _) => Selection::from_ids(tree.root_id(), ids),
        (None, Some(ranges)) => select_ranges(tree, ranges),
        (None, None) => Selection::whole(tree),
    }
}

fn editor_error(error: EditorError) -> ProtocolError {
    match error {
        EditorError::Transform(TransformError::InvalidArgument(message)) => {
            ProtocolError::invalid_params(message)
        }
        EditorError::Transform(error @ TransformError::NonPositiveDuration { .. }) => {
            ProtocolError::invalid_params(error.to_string())
        }
        EditorError::Tree(error) => {
            tracing::error!("[Handlers] tree out of sync with AST: {}", error);
            ProtocolError::invalid_request(error.to_string())
        }
    }
}

fn from_params<T: DeserializeOwned>(params: Value) -> ProtocolResult<T> {
    serde_json::from_value(params)
        .map_err(|e| ProtocolError::invalid_request(format!("Invalid params: {}", e)))
}

fn to_value<T: Serialize>(result: T) -> ProtocolResult<Value> {
    serde_json::to_value(result)
        .map_err(|e| ProtocolError::invalid_request(format!("Unserializable result: {}", e)))
}
