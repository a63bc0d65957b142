//! Stream schemas and the delimited row codec
//!
//! Each stream has a fixed, versioned header. Files written under an older
//! header layout are recognised and migrated to the current column set when
//! loaded; they are never rewritten.

pub mod codec;
mod versions;

pub use versions::*;

use crate::error::ValidationError;
use crate::table::Cell;
use crate::types::StreamKind;

/// A record type that belongs to exactly one stream
pub trait Record: Sized + Clone {
    /// Stream the record is appended to
    const STREAM: StreamKind;

    /// Apply the input-boundary rules: whole-second timestamps, blank free
    /// text made absent, required text present
    fn normalized(self) -> Result<Self, ValidationError>;

    /// Field values in current header order; `None` is an absent value
    fn to_fields(&self) -> Vec<Option<String>>;

    /// Typed cells in current header order
    fn to_row(&self) -> Vec<Cell>;

    /// Rebuild the record from decoded cells
    fn from_row(row: &[Cell]) -> Result<Self, String>;
}
