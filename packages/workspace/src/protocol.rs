//! Wire types and request validation
//!
//! Requests are newline-delimited JSON objects `{id, method, params}`;
//! responses carry either `result` or `error: {code, message}`.

use abc_editor::{NodeId, Range, TextEdit};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const APPLY_SELECTOR: &str = "abc.applySelector";
pub const APPLY_TRANSFORM: &str = "abc.applyTransform";
pub const OPEN_DOCUMENT: &str = "abc.openDocument";
pub const CLOSE_DOCUMENT: &str = "abc.closeDocument";

/// Editor custom request names
pub const EDITOR_APPLY_SELECTOR: &str = "abc/applySelector";
pub const EDITOR_APPLY_TRANSFORM: &str = "abc/applyTransform";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    DocumentNotFound,
    FileTypeNotSupported,
    InvalidRequest,
    UnknownMethod,
    InvalidParams,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::DocumentNotFound => -32001,
            ErrorCode::FileTypeNotSupported => -32002,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::UnknownMethod => -32601,
            ErrorCode::InvalidParams => -32602,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} ({code:?})")]
pub struct ProtocolError {
    pub code: ErrorCode,
    pub message: String,
}

impl ProtocolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn document_not_found(uri: &str) -> Self {
        Self::new(ErrorCode::DocumentNotFound, format!("Document not open: {}", uri))
    }
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, error: &ProtocolError) -> Self {
        Self {
            id,
            result: None,
            error: Some(ErrorBody {
                code: error.code.code(),
                message: error.message.clone(),
            }),
        }
    }
}

/// `applySelector` parameters
///
/// The starting selection is `cursorNodeIds` when given, else `ranges`,
/// else the whole document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorParams {
    pub uri: String,
    pub selector: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub cursor_node_ids: Option<Vec<Vec<NodeId>>>,
    #[serde(default)]
    pub ranges: Option<Vec<Range>>,
}

/// `applyTransform` parameters; editors send their ranges as `selections`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformParams {
    pub uri: String,
    pub transform: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub cursor_node_ids: Option<Vec<Vec<NodeId>>>,
    #[serde(default, alias = "selections")]
    pub ranges: Option<Vec<Range>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenParams {
    pub uri: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloseParams {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorResult {
    pub cursor_node_ids: Vec<Vec<NodeId>>,
    pub ranges: Vec<Range>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResult {
    pub new_text: String,
    pub text_edits: Vec<TextEdit>,
    pub cursor_ranges: Vec<Range>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenResult {
    pub version: u64,
}

/// Check a document URI before it reaches the store
///
/// The URI must be a `file://` URI without `..` segments, ending in one of
/// `extensions`. Segments are compared after percent-decoding.
pub fn validate_uri(uri: &str, extensions: &[String]) -> ProtocolResult<()> {
    let Some(encoded) = uri.strip_prefix("file://") else {
        return Err(ProtocolError::invalid_params(format!(
            "Expected a file:// URI, got {}",
            uri
        )));
    };
    let path = percent_decode_str(encoded).decode_utf8().map_err(|_| {
        ProtocolError::invalid_params(format!("URI is not valid UTF-8 once decoded: {}", uri))
    })?;
    if path.split('/').any(|segment| segment == "..") {
        return Err(ProtocolError::invalid_params(format!(
            "Path traversal in URI: {}",
            uri
        )));
    }
    let supported = path
        .rsplit_once('.')
        .is_some_and(|(_, ext)| extensions.iter().any(|known| known == ext));
    if !supported {
        return Err(ProtocolError::new(
            ErrorCode::FileTypeNotSupported,
            format!("Not an ABC document: {}", uri),
        ));
    }
    Ok(())
}
