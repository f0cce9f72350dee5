//! # ABC Workspace
//!
//! Protocol and validation layer around the editing core: open documents,
//! the selector/transform registry, request handlers and the socket server.

pub mod config;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod state;

pub use config::Config;
pub use handlers::{Handlers, SharedStore};
pub use protocol::{ErrorCode, ProtocolError, ProtocolResult, Request, Response};
pub use registry::{lookup_selector, lookup_transform, ArgKind, SelectorEntry, TransformEntry};
pub use server::{bind_first_server, resolve_socket_path, serve, BindOutcome};
pub use state::{DocumentStore, OpenDocument};
