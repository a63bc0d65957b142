//! In-memory tabular form of a loaded stream

use crate::error::JournalError;
use crate::schema::{schema_for, ColumnKind};
use crate::types::{StreamKind, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use serde::Serialize;

/// A single typed value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Timestamp(NaiveDateTime),
    Integer(i64),
    Text(String),
    /// No value recorded (blank free text)
    Absent,
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    /// Display form used for frequency keys and text output
    pub fn display(&self) -> Option<String> {
        match self {
            Cell::Timestamp(ts) => Some(ts.format(TIMESTAMP_FORMAT).to_string()),
            Cell::Integer(i) => Some(i.to_string()),
            Cell::Text(s) => Some(s.clone()),
            Cell::Absent => None,
        }
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    /// False when the file's schema version has no such column
    pub supported: bool,
}

/// A row is one cell per column, in column order
pub type Row = Vec<Cell>;

/// Ordered rows of one stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub stream: StreamKind,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Empty table carrying the stream's current columns
    pub fn empty(stream: StreamKind) -> Self {
        let columns = schema_for(stream)
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.to_string(),
                kind: c.kind,
                supported: true,
            })
            .collect();

        Table {
            stream,
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Resolve a column by name, failing with `UnknownField`
    pub fn require_column(&self, name: &str) -> Result<usize, JournalError> {
        self.column_index(name).ok_or_else(|| JournalError::UnknownField {
            stream: self.stream,
            field: name.to_string(),
        })
    }

    /// Index of the first timestamp column
    pub fn timestamp_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| c.kind == ColumnKind::Timestamp)
    }

    /// Timestamps in row order
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        match self.timestamp_index() {
            Some(idx) => self
                .rows
                .iter()
                .filter_map(|row| row.get(idx).and_then(Cell::as_timestamp))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Indices of numeric columns
    pub fn numeric_columns(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind == ColumnKind::Numeric)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_has_schema_columns() {
        let table = Table::empty(StreamKind::Symptoms);
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["timestamp", "symptom_type", "severity", "notes"]);
        assert!(table.is_empty());
        assert_eq!(table.numeric_columns(), vec![2]);
        assert_eq!(table.timestamp_index(), Some(0));
    }

    #[test]
    fn test_unknown_column() {
        let table = Table::empty(StreamKind::Meals);
        assert!(matches!(
            table.require_column("severity"),
            Err(JournalError::UnknownField { stream: StreamKind::Meals, .. })
        ));
    }
}
