//! # ABC Editor
//!
//! Structural editing core for ABC notation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: .abc text → AST (+ IdGenerator)     │
//! └─────────────────────────────────────────────┘
//!                     ↓ from_file
//! ┌─────────────────────────────────────────────┐
//! │ editor: CsTree (arena, sibling-linked)      │
//! │  - Selectors narrow a Selection             │
//! │  - Transforms mutate the tree in place      │
//! └─────────────────────────────────────────────┘
//!                     ↓ to_file + stringify
//! ┌─────────────────────────────────────────────┐
//! │ diff: old text vs new text → edit records   │
//! │ cursors: re-parse, remap by ordinal         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Identities, not positions**: selections name nodes by `NodeId`;
//!    positions are derived from tokens when needed
//! 2. **No parent links**: anything about ancestors is threaded down a walk
//! 3. **Text is the output**: every edit ends as a minimal text diff
//!
//! ## Usage
//!
//! ```rust,ignore
//! use abc_editor::{selectors, CsTree, EditPipeline, Selection, Transform};
//!
//! let output = abc_parser::parse(source);
//! let mut tree = CsTree::from_file(&output.file);
//!
//! let chords = selectors::select_chords(&tree, &Selection::whole(&tree));
//! let mut pipeline = EditPipeline::new(output.ids);
//! let outcome = pipeline.apply(source, &mut tree, &chords, &Transform::Transpose(2))?;
//!
//! for edit in outcome.edits {
//!     println!("{:?} -> {}", edit.range, edit.new_text);
//! }
//! ```

mod cstree;
mod errors;
mod from_ast;
mod pipeline;
mod position;
mod selection;
mod to_ast;

pub mod cursors;
pub mod diff;
pub mod selectors;
pub mod transforms;

pub use cstree::{Children, CsNode, CsTree, NodeIdx, NodeTag, TokenData};
pub use diff::{EditKind, EditRecord, TextEdit};
pub use errors::{EditorError, TransformError, TreeError};
pub use pipeline::{cursor_ranges, EditOutcome, EditPipeline};
pub use position::{LineIndex, Position, Range};
pub use selection::{Cursor, Selection};
pub use transforms::{Duration, Transform, VoiceParams};

// Re-export parser types for convenience
pub use abc_parser::{IdGenerator, NodeId};
