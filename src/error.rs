//! Error types for Synheart Journal

use crate::types::StreamKind;
use serde::Serialize;
use thiserror::Error;

/// Errors raised at the input boundary, before a record can reach the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Severity must be between 1 and 10, got {value}")]
    SeverityOutOfRange { value: i64 },

    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid time '{0}' (expected HH:MM or HH:MM:SS)")]
    InvalidTime(String),

    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("Unknown {field} '{value}'")]
    UnknownCategory { field: &'static str, value: String },

    #[error("Unknown stream '{0}' (expected meals, symptoms or emotions)")]
    UnknownStream(String),
}

/// A row that could not be decoded under its stream schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("line {line}: {reason} (raw: {raw:?})")]
pub struct ParseError {
    /// 1-based line where the row starts
    pub line: usize,
    /// Why decoding failed
    pub reason: String,
    /// Raw row text as found on disk
    pub raw: String,
}

/// Errors that can occur while storing, loading or deriving journal data
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(ParseError),

    #[error("Unrecognised header for stream {stream}: {found:?}")]
    SchemaMismatch { stream: StreamKind, found: String },

    #[error("Stream {stream} has no field '{field}'")]
    UnknownField { stream: StreamKind, field: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Chat error: {0}")]
    Chat(String),
}

impl From<ParseError> for JournalError {
    fn from(e: ParseError) -> Self {
        JournalError::Parse(e)
    }
}
