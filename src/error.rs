//! Error types for DirDoc
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using DirDocError
pub type Result<T> = std::result::Result<T, DirDocError>;

/// Boxed error produced by user-supplied decoders and constructors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for DirDoc operations
#[derive(Debug, Error)]
pub enum DirDocError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Mapping Errors
    // -------------------------------------------------------------------------
    #[error("type '{type_name}' has no collection mapping")]
    UnmappedType { type_name: &'static str },

    #[error("collection '{collection}' is ambiguous: {matches:?}")]
    AmbiguousCollection {
        collection: String,
        matches: Vec<String>,
    },

    #[error("type '{type_name}' cannot be constructed: {reason}")]
    UnconstructableType {
        type_name: &'static str,
        reason: String,
    },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("type '{type_name}' cannot be stored and there is no codec registered")]
    NoCodecRegistered { type_name: &'static str },

    #[error("field '{field}' could not be decoded as '{type_name}': {source}")]
    Decode {
        field: String,
        type_name: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("field '{field}' holds an unrepresentable value: {reason}")]
    UnrepresentableValue { field: String, reason: String },

    // -------------------------------------------------------------------------
    // Key Errors
    // -------------------------------------------------------------------------
    #[error("sequence counter {path} is corrupt: {contents:?}")]
    CorruptSequenceState { path: PathBuf, contents: String },

    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
