//! # DirDoc
//!
//! A minimal document store that uses the filesystem as its storage engine:
//! - One directory per record type (collection)
//! - One subdirectory per record (document), named by its key
//! - One file per non-null field, holding the field's encoded text
//! - A per-collection `.seq` counter issuing keys "1", "2", ...
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Engine                              │
//! │            store / find / delete / get_all                   │
//! └──────────┬──────────────────┬───────────────────┬───────────┘
//!            │                  │                   │
//!            ▼                  ▼                   ▼
//!   ┌─────────────────┐ ┌───────────────┐  ┌─────────────────┐
//!   │     Models      │ │    Layout     │  │ Codec Registry  │
//!   │ (field access)  │ │ (directories) │  │ (value <-> text)│
//!   └─────────────────┘ └───────┬───────┘  └─────────────────┘
//!                               │
//!                               ▼
//!                       ┌───────────────┐
//!                       │ Key Allocator │
//!                       │    (.seq)     │
//!                       └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod sequence;
pub mod layout;
pub mod model;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BoxError, DirDocError, Result};
pub use config::Config;
pub use codec::CodecRegistry;
pub use model::{Model, Record};
pub use engine::{Documents, Engine};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of DirDoc
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
