//! Stream reader
//!
//! Loads a stream file into a [`Table`] in file order. Older header layouts
//! are migrated to the current column set on the fly; the file itself is
//! never modified. A missing stream loads as an empty table.

use crate::config::JournalConfig;
use crate::error::{JournalError, ParseError};
use crate::schema::{codec::RowParser, schema_for, Record};
use crate::table::Table;
use crate::types::StreamKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// What to do with a row that cannot be decoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Abort the load on the first malformed row
    Strict,
    /// Skip malformed rows, reporting each one
    #[default]
    Lenient,
}

impl FromStr for LoadPolicy {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(LoadPolicy::Strict),
            "lenient" => Ok(LoadPolicy::Lenient),
            other => Err(JournalError::Config(format!(
                "unknown load policy '{other}' (expected strict or lenient)"
            ))),
        }
    }
}

/// A row left out of a lenient load
pub type SkippedRow = ParseError;

/// Result of loading one stream
#[derive(Debug, Clone, Serialize)]
pub struct LoadedStream {
    pub table: Table,
    /// Layout version of the file; `None` when the stream has no file yet
    pub schema_version: Option<u32>,
    pub skipped: Vec<SkippedRow>,
    /// Source line of each table row
    #[serde(skip)]
    pub lines: Vec<usize>,
    /// Source text of each table row
    #[serde(skip)]
    pub raw: Vec<String>,
}

impl LoadedStream {
    fn empty(stream: StreamKind) -> Self {
        Self {
            table: Table::empty(stream),
            schema_version: None,
            skipped: Vec::new(),
            lines: Vec::new(),
            raw: Vec::new(),
        }
    }
}

/// Decode the text of a stream file
pub fn parse_stream(
    stream: StreamKind,
    content: &str,
    policy: LoadPolicy,
) -> Result<LoadedStream, JournalError> {
    decode_stream(stream, content, &[], policy)
}

/// Decode stream file bytes. A record holding bytes that are not UTF-8 is
/// treated as malformed; the rest of the file still loads.
pub fn parse_stream_bytes(
    stream: StreamKind,
    content: &[u8],
    policy: LoadPolicy,
) -> Result<LoadedStream, JournalError> {
    let (text, invalid) = decode_lossy(content);
    decode_stream(stream, &text, &invalid, policy)
}

/// Replace each invalid UTF-8 sequence with U+FFFD, returning the decoded
/// text and the offsets of the replacements in it
fn decode_lossy(bytes: &[u8]) -> (String, Vec<usize>) {
    let mut text = String::with_capacity(bytes.len());
    let mut invalid = Vec::new();
    let mut rest = bytes;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                text.push_str(valid);
                return (text, invalid);
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                text.push_str(&String::from_utf8_lossy(valid));
                invalid.push(text.len());
                text.push(char::REPLACEMENT_CHARACTER);
                rest = &after[e.error_len().unwrap_or(after.len())..];
            }
        }
    }
}

fn decode_stream(
    stream: StreamKind,
    content: &str,
    invalid: &[usize],
    policy: LoadPolicy,
) -> Result<LoadedStream, JournalError> {
    let schema = schema_for(stream);
    let mut records = RowParser::new(content);

    let header = match records.next() {
        None => return Ok(LoadedStream::empty(stream)),
        Some(Ok(header)) => header,
        Some(Err(e)) => {
            return Err(JournalError::SchemaMismatch {
                stream,
                found: e.raw,
            })
        }
    };
    let version = schema
        .detect_version(&header.fields)
        .ok_or_else(|| JournalError::SchemaMismatch {
            stream,
            found: header.raw.clone(),
        })?;
    if !version.is_current() {
        warn!(
            stream = %stream,
            version = version.version,
            "reading legacy layout, migrating rows to the current columns"
        );
    }

    let mut loaded = LoadedStream::empty(stream);
    loaded.schema_version = Some(version.version);
    for (column, source) in loaded
        .table
        .columns
        .iter_mut()
        .zip(version.source_positions(schema))
    {
        column.supported = source.is_some();
    }

    for record in records {
        let decoded = record.and_then(|row| {
            let span = row.offset..row.offset + row.raw.len();
            let result = if invalid.iter().any(|i| span.contains(i)) {
                Err("invalid UTF-8".to_string())
            } else {
                schema.decode_row(version, &row.fields)
            };
            match result {
                Ok(cells) => Ok((row.line, row.raw, cells)),
                Err(reason) => Err(ParseError {
                    line: row.line,
                    reason,
                    raw: row.raw,
                }),
            }
        });

        match decoded {
            Ok((line, raw, cells)) => {
                loaded.table.rows.push(cells);
                loaded.lines.push(line);
                loaded.raw.push(raw);
            }
            Err(e) => skip_or_fail(stream, policy, e, &mut loaded.skipped)?,
        }
    }

    Ok(loaded)
}

fn skip_or_fail(
    stream: StreamKind,
    policy: LoadPolicy,
    error: ParseError,
    skipped: &mut Vec<SkippedRow>,
) -> Result<(), JournalError> {
    match policy {
        LoadPolicy::Strict => Err(error.into()),
        LoadPolicy::Lenient => {
            warn!(
                stream = %stream,
                line = error.line,
                reason = %error.reason,
                raw = %error.raw,
                "skipping malformed row"
            );
            skipped.push(error);
            Ok(())
        }
    }
}

/// Reads stream files from a data directory
#[derive(Debug, Clone)]
pub struct StreamReader {
    root: PathBuf,
    policy: LoadPolicy,
}

impl StreamReader {
    pub fn new(root: impl Into<PathBuf>, policy: LoadPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    pub fn from_config(config: &JournalConfig) -> Self {
        Self::new(config.data_dir.clone(), config.load_policy)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }

    pub fn load(&self, stream: StreamKind) -> Result<LoadedStream, JournalError> {
        let path = self.root.join(stream.file_name());
        if !path.exists() {
            debug!(stream = %stream, path = %path.display(), "stream file missing, empty table");
            return Ok(LoadedStream::empty(stream));
        }

        let content = fs::read(&path)?;
        let loaded = parse_stream_bytes(stream, &content, self.policy)?;
        debug!(
            stream = %stream,
            rows = loaded.table.len(),
            skipped = loaded.skipped.len(),
            "loaded stream"
        );
        Ok(loaded)
    }

    /// Load every stream, in `StreamKind::ALL` order
    pub fn load_all(&self) -> Result<Vec<LoadedStream>, JournalError> {
        StreamKind::ALL.iter().map(|s| self.load(*s)).collect()
    }

    /// Load a stream as typed records
    pub fn load_records<R: Record>(&self) -> Result<Vec<R>, JournalError> {
        let mut loaded = self.load(R::STREAM)?;
        let mut records = Vec::with_capacity(loaded.table.len());

        for ((row, line), raw) in loaded.table.rows.iter().zip(&loaded.lines).zip(&loaded.raw) {
            match R::from_row(row) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    let error = ParseError {
                        line: *line,
                        reason,
                        raw: raw.clone(),
                    };
                    skip_or_fail(R::STREAM, self.policy, error, &mut loaded.skipped)?;
                }
            }
        }
        Ok(records)
    }
}
