//! Error types for the editor

use crate::cstree::NodeTag;
use abc_parser::NodeId;
use thiserror::Error;

/// The tree no longer has a shape the AST can represent
///
/// Raised by the tree-to-AST builders. It means the tree model and the AST
/// disagree, so it is never recovered from silently.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Unexpected shape for {tag:?} node {id}: {detail}")]
    UnexpectedShape {
        tag: NodeTag,
        id: NodeId,
        detail: String,
    },
}

impl TreeError {
    pub(crate) fn shape(tag: NodeTag, id: NodeId, detail: impl Into<String>) -> Self {
        TreeError::UnexpectedShape {
            tag,
            id,
            detail: detail.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Duration of node {id} would become {value}")]
    NonPositiveDuration { id: NodeId, value: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),
}
