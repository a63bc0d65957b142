//! Synheart Journal - append-only meal, symptom and emotion journal
//!
//! Records are validated at the input boundary, appended to one delimited
//! file per stream, read back into typed tables, and turned into derived
//! views: form input → record → store → reader → views.
//!
//! ## Modules
//!
//! - **Records**: `types` and the `forms` input boundary
//! - **Storage**: `store` (append-only writes) and `reader` (versioned loads)
//! - **Views**: summaries, frequency rankings, cumulative timelines, correlations
//! - **Chat**: questions over the raw stream files through an `AnswerEngine`

pub mod chat;
pub mod config;
pub mod error;
pub mod forms;
pub mod reader;
pub mod schema;
pub mod store;
pub mod table;
pub mod types;
pub mod views;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::JournalConfig;
pub use error::{JournalError, ParseError, ValidationError};
pub use reader::{LoadPolicy, LoadedStream, StreamReader};
pub use store::{AppendReceipt, JournalStore};
pub use table::{Cell, Column, Table};
pub use types::{
    EmotionEntry, EmotionType, MealEntry, MealType, Severity, StreamKind, SymptomEntry,
    SymptomType,
};

// Schema exports
pub use schema::{Record, CURRENT_VERSION};

/// Library version
pub const JOURNAL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI and FFI consumers
pub const PRODUCER_NAME: &str = "synheart-journal";
