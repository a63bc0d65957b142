//! Versioned stream layouts
//!
//! Version 1 is the layout of the first release (`datetime`, `food`, `notes`);
//! version 2 renamed the meal and timestamp columns and introduced the
//! emotions stream. Columns are matched by name (or legacy alias), so a file
//! is decoded under the layout its own header declares.

use crate::error::ValidationError;
use crate::table::Cell;
use crate::types::{
    canonical_label, truncate_to_second, EmotionType, MealType, Severity, StreamKind, SymptomType,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Layout version written for new files
pub const CURRENT_VERSION: u32 = 2;

/// Accepted on-disk timestamp layouts, tried in order
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// How a column's values are typed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Timestamp,
    Categorical,
    Numeric,
    Text,
}

type Canonicalizer = fn(&str) -> Result<&'static str, ValidationError>;

/// One column of the current layout
#[derive(Debug)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
    /// Names this column had in earlier layouts
    pub aliases: &'static [&'static str],
    canonical: Option<Canonicalizer>,
    range: Option<(i64, i64)>,
}

/// A header layout recognised for a stream
#[derive(Debug)]
pub struct SchemaVersion {
    pub stream: StreamKind,
    pub version: u32,
    pub header: &'static [&'static str],
}

/// Current column set plus every recognised layout of one stream
#[derive(Debug)]
pub struct StreamSchema {
    pub stream: StreamKind,
    pub columns: &'static [ColumnSpec],
    pub versions: &'static [SchemaVersion],
}

const TIMESTAMP_COLUMN: ColumnSpec = ColumnSpec {
    name: "timestamp",
    kind: ColumnKind::Timestamp,
    required: true,
    aliases: &["datetime"],
    canonical: None,
    range: None,
};

const SEVERITY_COLUMN: ColumnSpec = ColumnSpec {
    name: "severity",
    kind: ColumnKind::Numeric,
    required: true,
    aliases: &[],
    canonical: None,
    range: Some((Severity::MIN, Severity::MAX)),
};

const NOTES_COLUMN: ColumnSpec = ColumnSpec {
    name: "notes",
    kind: ColumnKind::Text,
    required: false,
    aliases: &[],
    canonical: None,
    range: None,
};

static MEALS: StreamSchema = StreamSchema {
    stream: StreamKind::Meals,
    columns: &[
        TIMESTAMP_COLUMN,
        ColumnSpec {
            name: "meal_type",
            kind: ColumnKind::Categorical,
            required: true,
            aliases: &[],
            canonical: Some(canonical_label::<MealType>),
            range: None,
        },
        ColumnSpec {
            name: "food_consumed",
            kind: ColumnKind::Text,
            required: true,
            aliases: &["food"],
            canonical: None,
            range: None,
        },
        ColumnSpec {
            name: "optional_notes",
            kind: ColumnKind::Text,
            required: false,
            aliases: &["notes"],
            canonical: None,
            range: None,
        },
    ],
    versions: &[
        SchemaVersion {
            stream: StreamKind::Meals,
            version: 1,
            header: &["datetime", "meal_type", "food", "notes"],
        },
        SchemaVersion {
            stream: StreamKind::Meals,
            version: 2,
            header: &["timestamp", "meal_type", "food_consumed", "optional_notes"],
        },
    ],
};

static SYMPTOMS: StreamSchema = StreamSchema {
    stream: StreamKind::Symptoms,
    columns: &[
        TIMESTAMP_COLUMN,
        ColumnSpec {
            name: "symptom_type",
            kind: ColumnKind::Categorical,
            required: true,
            aliases: &[],
            canonical: Some(canonical_label::<SymptomType>),
            range: None,
        },
        SEVERITY_COLUMN,
        NOTES_COLUMN,
    ],
    versions: &[
        SchemaVersion {
            stream: StreamKind::Symptoms,
            version: 1,
            header: &["datetime", "symptom_type", "severity", "notes"],
        },
        SchemaVersion {
            stream: StreamKind::Symptoms,
            version: 2,
            header: &["timestamp", "symptom_type", "severity", "notes"],
        },
    ],
};

static EMOTIONS: StreamSchema = StreamSchema {
    stream: StreamKind::Emotions,
    columns: &[
        TIMESTAMP_COLUMN,
        ColumnSpec {
            name: "emotion_type",
            kind: ColumnKind::Categorical,
            required: true,
            aliases: &[],
            canonical: Some(canonical_label::<EmotionType>),
            range: None,
        },
        SEVERITY_COLUMN,
        NOTES_COLUMN,
    ],
    versions: &[SchemaVersion {
        stream: StreamKind::Emotions,
        version: 2,
        header: &["timestamp", "emotion_type", "severity", "notes"],
    }],
};

/// Schema for a stream
pub fn schema_for(stream: StreamKind) -> &'static StreamSchema {
    match stream {
        StreamKind::Meals => &MEALS,
        StreamKind::Symptoms => &SYMPTOMS,
        StreamKind::Emotions => &EMOTIONS,
    }
}

impl StreamSchema {
    /// Header written to new files
    pub fn header(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn current(&self) -> &'static SchemaVersion {
        self.versions
            .iter()
            .find(|v| v.version == CURRENT_VERSION)
            .unwrap_or(&self.versions[self.versions.len() - 1])
    }

    /// Match a header row against the known layouts
    pub fn detect_version(&self, header: &[Option<String>]) -> Option<&'static SchemaVersion> {
        self.versions.iter().find(|v| {
            v.header.len() == header.len()
                && v
                    .header
                    .iter()
                    .zip(header)
                    .all(|(expected, found)| found.as_deref().map(str::trim) == Some(*expected))
        })
    }

    /// Decode raw fields laid out under `version` into current-order cells
    pub fn decode_row(
        &self,
        version: &SchemaVersion,
        fields: &[Option<String>],
    ) -> Result<Vec<Cell>, String> {
        if fields.len() != version.header.len() {
            return Err(format!(
                "expected {} fields, found {}",
                version.header.len(),
                fields.len()
            ));
        }

        let mapping = version.source_positions(self);
        self.columns
            .iter()
            .zip(mapping)
            .map(|(spec, source)| {
                let value = source.and_then(|i| fields[i].as_deref());
                spec.decode(value).map_err(|e| format!("{}: {}", spec.name, e))
            })
            .collect()
    }
}

impl SchemaVersion {
    pub fn is_current(&self) -> bool {
        self.version == CURRENT_VERSION
    }

    /// For each current column, its position in this layout
    pub fn source_positions(&self, schema: &StreamSchema) -> Vec<Option<usize>> {
        schema
            .columns
            .iter()
            .map(|spec| self.header.iter().position(|h| spec.matches(h)))
            .collect()
    }

    /// Re-lay current-order fields into this layout's column order
    pub fn arrange(&self, schema: &StreamSchema, fields: &[Option<String>]) -> Vec<Option<String>> {
        self.header
            .iter()
            .map(|h| {
                schema
                    .columns
                    .iter()
                    .position(|spec| spec.matches(h))
                    .and_then(|i| fields.get(i).cloned().flatten())
            })
            .collect()
    }
}

impl ColumnSpec {
    fn matches(&self, header_name: &str) -> bool {
        self.name == header_name || self.aliases.contains(&header_name)
    }

    /// Decode one raw value; blank values count as absent
    pub fn decode(&self, value: Option<&str>) -> Result<Cell, String> {
        let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
            return if self.required {
                Err("missing required value".to_string())
            } else {
                Ok(Cell::Absent)
            };
        };

        match self.kind {
            ColumnKind::Timestamp => parse_timestamp(raw)
                .map(Cell::Timestamp)
                .map_err(|e| e.to_string()),
            ColumnKind::Categorical => match self.canonical {
                Some(canonicalize) => canonicalize(raw)
                    .map(|label| Cell::Text(label.to_string()))
                    .map_err(|e| e.to_string()),
                None => Ok(Cell::Text(raw.trim().to_string())),
            },
            ColumnKind::Numeric => {
                let n = parse_integer(raw)?;
                if let Some((lo, hi)) = self.range {
                    if !(lo..=hi).contains(&n) {
                        return Err(format!("value {n} outside {lo}..={hi}"));
                    }
                }
                Ok(Cell::Integer(n))
            }
            ColumnKind::Text => Ok(Cell::Text(raw.to_string())),
        }
    }
}

/// Parse an on-disk or user-supplied timestamp, truncated to seconds
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, ValidationError> {
    let trimmed = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(truncate_to_second)
        .ok_or_else(|| ValidationError::InvalidTimestamp(raw.to_string()))
}

// Integral floats ("5.0") appear when a numeric column was written by a dataframe
fn parse_integer(raw: &str) -> Result<i64, String> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.is_finite() => Ok(f as i64),
        _ => Err(format!("'{raw}' is not an integer")),
    }
}
