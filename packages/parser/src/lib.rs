//! # ABC notation front-end
//!
//! Tokenizer, typed AST and lossless serializer for ABC music notation.
//! Every node and token carries an identity minted by the document's
//! [`IdGenerator`], which is handed back with the parse result.

pub mod ast;
pub mod error;
pub mod id_generator;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

#[cfg(test)]
mod tests_serializer;

pub use error::{ParseError, ParseResult};
pub use id_generator::{IdGenerator, NodeId};
pub use parser::{parse, parse_with_ids, ParseOutput, Parser};
pub use serializer::{stringify, stringify_expr, Serializer};
pub use tokenizer::{tokenize, Token, TokenKind};

#[cfg(feature = "pretty-errors")]
pub use error::format_errors;
