//! Append-only stream store
//!
//! One file per stream under a data directory. A file is created with its
//! header on the first append; after that rows are only ever appended.
//! Appending inspects the header line to find the layout the file was
//! created with. Existing rows are only scanned when the file does not end
//! in a line break, to close a record cut short by an interrupted write.

use crate::config::JournalConfig;
use crate::error::JournalError;
use crate::schema::{codec, schema_for, Record, SchemaVersion};
use crate::types::StreamKind;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of a successful append
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppendReceipt {
    pub stream: StreamKind,
    pub path: PathBuf,
    /// The header was written by this append (new, empty or blank file)
    pub created: bool,
    /// Layout version the row was written under
    pub schema_version: u32,
    pub bytes_written: usize,
}

#[derive(Debug, Clone)]
pub struct JournalStore {
    root: PathBuf,
    lock_appends: bool,
}

impl JournalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_appends: false,
        }
    }

    pub fn from_config(config: &JournalConfig) -> Self {
        Self::new(config.data_dir.clone()).with_locking(config.lock_appends)
    }

    /// Take an exclusive advisory lock on the stream file for each append
    pub fn with_locking(mut self, lock_appends: bool) -> Self {
        self.lock_appends = lock_appends;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, stream: StreamKind) -> PathBuf {
        self.root.join(stream.file_name())
    }

    pub fn stream_exists(&self, stream: StreamKind) -> bool {
        self.path_for(stream).is_file()
    }

    /// Append one record to its stream
    pub fn append<R: Record>(&self, record: &R) -> Result<AppendReceipt, JournalError> {
        // Fields are public; nothing reaches disk without the boundary rules
        let record = record.clone().normalized()?;
        fs::create_dir_all(&self.root)?;

        let path = self.path_for(R::STREAM);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        if self.lock_appends {
            fs2::FileExt::lock_exclusive(&file)?;
        }
        let written = write_record(&file, R::STREAM, &record.to_fields());
        if self.lock_appends {
            fs2::FileExt::unlock(&file)?;
        }
        let (created, schema_version, bytes_written) = written?;

        debug!(
            stream = %R::STREAM,
            path = %path.display(),
            created,
            schema_version,
            bytes_written,
            "appended record"
        );

        Ok(AppendReceipt {
            stream: R::STREAM,
            path,
            created,
            schema_version,
            bytes_written,
        })
    }
}

/// Write one row (and the header for a new file) with a single `write_all`
fn write_record(
    file: &File,
    stream: StreamKind,
    fields: &[Option<String>],
) -> Result<(bool, u32, usize), JournalError> {
    let schema = schema_for(stream);
    let mut buf = String::new();

    let len = file.metadata()?.len();
    let layout = if len == 0 {
        None
    } else {
        existing_layout(file, stream)?
    };
    if len > 0 {
        close_interrupted_record(file, &mut buf)?;
    }

    let (created, version) = match layout {
        None => {
            buf.push_str(&codec::encode_header(&schema.header()));
            buf.push_str(&codec::encode_row(fields));
            (true, schema.current())
        }
        Some(version) if version.is_current() => {
            buf.push_str(&codec::encode_row(fields));
            (false, version)
        }
        Some(version) => {
            buf.push_str(&codec::encode_row(&version.arrange(schema, fields)));
            (false, version)
        }
    };

    let mut handle = file;
    handle.write_all(buf.as_bytes())?;
    Ok((created, version.version, buf.len()))
}

/// Layout declared by the header of an existing stream file; `None` when the
/// file holds nothing but blank lines
fn existing_layout(
    file: &File,
    stream: StreamKind,
) -> Result<Option<&'static SchemaVersion>, JournalError> {
    let mut handle = file;
    handle.seek(SeekFrom::Start(0))?;
    let mut reader = BufReader::new(handle);

    let mut header = String::new();
    loop {
        header.clear();
        if reader.read_line(&mut header)? == 0 {
            return Ok(None);
        }
        if !header.trim_end_matches(['\r', '\n']).is_empty() {
            break;
        }
    }

    let fields = codec::RowParser::new(&header)
        .next()
        .and_then(Result::ok)
        .map(|row| row.fields)
        .unwrap_or_default();

    schema_for(stream)
        .detect_version(&fields)
        .map(Some)
        .ok_or_else(|| JournalError::SchemaMismatch {
            stream,
            found: header.trim_end().to_string(),
        })
}

/// Terminate a record left unfinished by an interrupted write so the next
/// row starts on a line of its own. A quoted field left open is closed
/// first, otherwise it would swallow every row appended after it.
fn close_interrupted_record(file: &File, buf: &mut String) -> Result<(), JournalError> {
    let mut handle = file;
    handle.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    handle.read_exact(&mut last)?;
    if last[0] == b'\n' {
        return Ok(());
    }

    handle.seek(SeekFrom::Start(0))?;
    let mut quotes = 0usize;
    for byte in BufReader::new(handle).bytes() {
        if byte? == b'"' {
            quotes += 1;
        }
    }
    if quotes % 2 == 1 {
        buf.push('"');
    }
    buf.push('\n');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParseError, ValidationError};
    use crate::reader::{LoadPolicy, StreamReader};
    use crate::types::{MealEntry, MealType, Severity, SymptomEntry, SymptomType};
    use chrono::{NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn meal(food: &str, notes: Option<&str>) -> MealEntry {
        MealEntry::new(at(8, 0), MealType::Breakfast, food, notes.map(String::from)).unwrap()
    }

    #[test]
    fn test_first_append_writes_header() {
        let dir = TempDir::new().unwrap();
        let store = JournalStore::new(dir.path().join("data"));

        let receipt = store.append(&meal("eggs", None)).unwrap();
        assert!(receipt.created);
        assert_eq!(receipt.schema_version, 2);

        let receipt = store.append(&meal("toast", Some("with jam"))).unwrap();
        assert!(!receipt.created);

        let content = fs::read_to_string(store.path_for(StreamKind::Meals)).unwrap();
        assert_eq!(
            content,
            "timestamp,meal_type,food_consumed,optional_notes\n\
             2024-01-01 08:00:00,Breakfast,eggs,\n\
             2024-01-01 08:00:00,Breakfast,toast,with jam\n"
        );
    }

    #[test]
    fn test_append_leaves_existing_bytes_untouched() {
        let dir = TempDir::new().unwrap();
        let store = JournalStore::new(dir.path());
        let path = store.path_for(StreamKind::Symptoms);

        let first = SymptomEntry::new(at(9, 0), SymptomType::Headache, Severity::new(4).unwrap(), None);
        store.append(&first).unwrap();
        let before = fs::read(&path).unwrap();

        let second = SymptomEntry::new(
            at(9, 30),
            SymptomType::Nausea,
            Severity::new(7).unwrap(),
            Some("after coffee, bad".into()),
        );
        let receipt = store.append(&second).unwrap();
        let after = fs::read(&path).unwrap();

        assert_eq!(&after[..before.len()], &before[..]);
        assert_eq!(after.len(), before.len() + receipt.bytes_written);
        assert!(String::from_utf8(after)
            .unwrap()
            .ends_with("Nausea,7,\"after coffee, bad\"\n"));
    }

    #[test]
    fn test_legacy_file_keeps_its_layout() {
        let dir = TempDir::new().unwrap();
        let store = JournalStore::new(dir.path());
        let path = store.path_for(StreamKind::Meals);
        fs::write(&path, "datetime,meal_type,food,notes\n2023-12-31 19:00:00,Dinner,pasta,\n").unwrap();

        let receipt = store.append(&meal("eggs", Some("runny"))).unwrap();
        assert_eq!(receipt.schema_version, 1);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("datetime,meal_type,food,notes\n"));
        assert!(content.ends_with("2024-01-01 08:00:00,Breakfast,eggs,runny\n"));
    }

    #[test]
    fn test_unknown_header_is_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let store = JournalStore::new(dir.path());
        fs::write(store.path_for(StreamKind::Meals), "when,what\n").unwrap();

        let err = store.append(&meal("eggs", None)).unwrap_err();
        assert!(matches!(
            err,
            JournalError::SchemaMismatch { stream: StreamKind::Meals, ref found } if found == "when,what"
        ));
    }

    #[test]
    fn test_truncated_last_row_is_not_joined() {
        let dir = TempDir::new().unwrap();
        let store = JournalStore::new(dir.path());
        let path = store.path_for(StreamKind::Meals);
        fs::write(&path, "timestamp,meal_type,food_consumed,optional_notes\n2024-01-01 07:00:00,Snack,ap").unwrap();

        store.append(&meal("eggs", None)).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("Snack,ap\n2024-01-01 08:00:00,Breakfast,eggs,\n"));
    }

    #[test]
    fn test_truncated_quoted_field_is_closed() {
        let dir = TempDir::new().unwrap();
        let store = JournalStore::new(dir.path());
        let path = store.path_for(StreamKind::Meals);
        fs::write(
            &path,
            "timestamp,meal_type,food_consumed,optional_notes\n2024-01-01 07:00:00,Snack,\"apple, pe",
        )
        .unwrap();

        store.append(&meal("rice, beans", None)).unwrap();
        store.append(&meal("soup", Some("said \"hot\""))).unwrap();
        store.append(&meal("toast", None)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Snack,\"apple, pe\"\n2024-01-01 08:00:00,Breakfast,\"rice, beans\",\n"));

        let lenient = StreamReader::new(dir.path(), LoadPolicy::Lenient)
            .load(StreamKind::Meals)
            .unwrap();
        assert_eq!(lenient.table.len(), 3);
        assert_eq!(lenient.lines, vec![3, 4, 5]);
        assert_eq!(lenient.skipped.len(), 1);
        assert_eq!(lenient.skipped[0].line, 2);

        let err = StreamReader::new(dir.path(), LoadPolicy::Strict)
            .load(StreamKind::Meals)
            .unwrap_err();
        assert!(matches!(err, JournalError::Parse(ParseError { line: 2, .. })));
    }

    #[test]
    fn test_append_applies_boundary_rules() {
        let dir = TempDir::new().unwrap();
        let store = JournalStore::new(dir.path().join("data"));

        let empty_food = MealEntry {
            timestamp: at(8, 0),
            meal_type: MealType::Lunch,
            food_consumed: String::new(),
            optional_notes: Some(String::new()),
        };
        assert!(matches!(
            store.append(&empty_food),
            Err(JournalError::Validation(ValidationError::EmptyField("food_consumed")))
        ));
        assert!(!store.root().exists());

        let raw = MealEntry {
            timestamp: at(8, 0) + chrono::Duration::milliseconds(750),
            meal_type: MealType::Lunch,
            food_consumed: "salad".to_string(),
            optional_notes: Some("   ".to_string()),
        };
        store.append(&raw).unwrap();
        let content = fs::read_to_string(store.path_for(StreamKind::Meals)).unwrap();
        assert!(content.ends_with("\n2024-01-01 08:00:00,Lunch,salad,\n"));

        let loaded: Vec<MealEntry> = StreamReader::new(store.root(), LoadPolicy::Strict)
            .load_records()
            .unwrap();
        assert_eq!(loaded, vec![raw.normalized().unwrap()]);
    }

    #[test]
    fn test_blank_file_gets_header() {
        let dir = TempDir::new().unwrap();
        let store = JournalStore::new(dir.path());
        let path = store.path_for(StreamKind::Meals);
        fs::write(&path, "\n\r\n").unwrap();

        let receipt = store.append(&meal("eggs", None)).unwrap();
        assert!(receipt.created);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "\n\r\ntimestamp,meal_type,food_consumed,optional_notes\n\
             2024-01-01 08:00:00,Breakfast,eggs,\n"
        );

        let loaded = StreamReader::new(dir.path(), LoadPolicy::Strict)
            .load(StreamKind::Meals)
            .unwrap();
        assert_eq!(loaded.table.len(), 1);
    }

    #[test]
    fn test_locked_append_and_unwritable_root() {
        let dir = TempDir::new().unwrap();
        let store = JournalStore::new(dir.path()).with_locking(true);
        assert!(store.append(&meal("eggs", None)).is_ok());
        assert!(store.stream_exists(StreamKind::Meals));

        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();
        let store = JournalStore::new(&blocker);
        assert!(matches!(
            store.append(&meal("eggs", None)),
            Err(JournalError::Storage(_))
        ));
    }
}
