//! Typed failures for the device model.
//!
//! Every failure is synchronous and typed. The model surfaces the first
//! failure it encounters and leaves the document untouched: validation
//! strictly precedes mutation, so a failed operation is a no-op. Mapping
//! these onto wire status codes or user-visible messages is the embedding
//! service's job; the core never logs, retries, or swallows them.

use thiserror::Error;

/// Failure taxonomy for model operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed address string or undecodable document.
    #[error("parse error: {0}")]
    Parse(String),

    /// Unknown top-level oid, or a missing import resource.
    #[error("not found: {0}")]
    NotFound(String),

    /// Wrong segment kind for the context, an unsupported path shape for
    /// the requested operation, or an out-of-range array index.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing or mismatched value variant, a requested type that does not
    /// match the declared type, or a missing struct field.
    #[error("schema error: {0}")]
    Schema(String),

    /// Recognized but unbuilt: remote imports, STRUCT_ARRAY navigation,
    /// insertion below the top level.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Constraint variant incompatible with the parameter type, or an
    /// exhausted pointer popped again.
    #[error("range error: {0}")]
    Range(String),

    /// Invalid runtime configuration (logging or config file values).
    #[error("config error: {0}")]
    Config(String),

    /// Underlying I/O failure from the content fetcher.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
