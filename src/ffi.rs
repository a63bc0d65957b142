//! FFI bindings for Synheart Journal
//!
//! C-compatible functions for presentation layers written in other languages.
//! Every function takes the data directory as its first argument, exchanges
//! JSON as null-terminated C strings, and returns allocated memory that must
//! be freed by the caller using `journal_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;

use crate::config::JournalConfig;
use crate::error::JournalError;
use crate::forms::{EmotionForm, MealForm, SymptomForm};
use crate::reader::{LoadPolicy, StreamReader};
use crate::store::{AppendReceipt, JournalStore};
use crate::types::{EmotionEntry, MealEntry, StreamKind, SymptomEntry};
use crate::views::{self, Alignment};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

unsafe fn required(ptr: *const c_char, name: &str) -> Result<String, String> {
    cstr_to_string(ptr).ok_or_else(|| format!("Invalid {name} string pointer"))
}

/// Return JSON on success; NULL with the last error set otherwise
fn respond(result: Result<String, String>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(msg) => {
            set_last_error(&msg);
            ptr::null_mut()
        }
    }
}

/// Return 0 on success; -1 with the last error set otherwise
fn status(result: Result<(), String>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(msg) => {
            set_last_error(&msg);
            -1
        }
    }
}

fn config_for(data_dir: &str) -> Result<JournalConfig, String> {
    JournalConfig::load_from_dir(Path::new(data_dir)).map_err(|e| e.to_string())
}

fn parse_stream(name: &str) -> Result<StreamKind, String> {
    name.parse::<StreamKind>().map_err(|e| e.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

fn append_record_json(
    store: &JournalStore,
    stream: StreamKind,
    json: &str,
) -> Result<AppendReceipt, JournalError> {
    match stream {
        StreamKind::Meals => store.append(&serde_json::from_str::<MealEntry>(json)?),
        StreamKind::Symptoms => store.append(&serde_json::from_str::<SymptomEntry>(json)?),
        StreamKind::Emotions => store.append(&serde_json::from_str::<EmotionEntry>(json)?),
    }
}

fn append_form_json(
    store: &JournalStore,
    stream: StreamKind,
    json: &str,
) -> Result<AppendReceipt, JournalError> {
    match stream {
        StreamKind::Meals => store.append(&serde_json::from_str::<MealForm>(json)?.validate()?),
        StreamKind::Symptoms => {
            store.append(&serde_json::from_str::<SymptomForm>(json)?.validate()?)
        }
        StreamKind::Emotions => {
            store.append(&serde_json::from_str::<EmotionForm>(json)?.validate()?)
        }
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Append one record given as JSON (`{"timestamp": "2024-01-01T08:00:00", ...}`).
///
/// # Safety
/// - `data_dir`, `stream`, and `record_json` must be valid null-terminated C strings.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `journal_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn journal_append(
    data_dir: *const c_char,
    stream: *const c_char,
    record_json: *const c_char,
) -> i32 {
    clear_last_error();

    status((|| {
        let config = config_for(&required(data_dir, "data_dir")?)?;
        let stream = parse_stream(&required(stream, "stream")?)?;
        let json = required(record_json, "record_json")?;
        append_record_json(&JournalStore::from_config(&config), stream, &json)
            .map(|_| ())
            .map_err(|e| e.to_string())
    })())
}

/// Validate raw form values (separate `date` and `time` strings) and append.
///
/// # Safety
/// - `data_dir`, `stream`, and `form_json` must be valid null-terminated C strings.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `journal_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn journal_append_form(
    data_dir: *const c_char,
    stream: *const c_char,
    form_json: *const c_char,
) -> i32 {
    clear_last_error();

    status((|| {
        let config = config_for(&required(data_dir, "data_dir")?)?;
        let stream = parse_stream(&required(stream, "stream")?)?;
        let json = required(form_json, "form_json")?;
        append_form_json(&JournalStore::from_config(&config), stream, &json)
            .map(|_| ())
            .map_err(|e| e.to_string())
    })())
}

// ============================================================================
// Reading and derived views
// ============================================================================

/// Load one stream as a JSON table.
///
/// # Safety
/// - `data_dir` and `stream` must be valid null-terminated C strings.
/// - `strict` non-zero aborts on the first malformed row; zero skips and reports them.
/// - Returns a newly allocated string that must be freed with `journal_free_string`.
/// - Returns NULL on error; call `journal_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn journal_load(
    data_dir: *const c_char,
    stream: *const c_char,
    strict: i32,
) -> *mut c_char {
    clear_last_error();

    respond((|| {
        let config = config_for(&required(data_dir, "data_dir")?)?;
        let stream = parse_stream(&required(stream, "stream")?)?;
        let policy = if strict != 0 {
            LoadPolicy::Strict
        } else {
            LoadPolicy::Lenient
        };
        let loaded = StreamReader::new(config.data_dir, policy)
            .load(stream)
            .map_err(|e| e.to_string())?;
        to_json(&loaded)
    })())
}

/// Summary statistics for one stream.
///
/// # Safety
/// - `data_dir` and `stream` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `journal_free_string`.
/// - Returns NULL on error; call `journal_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn journal_summarize(
    data_dir: *const c_char,
    stream: *const c_char,
) -> *mut c_char {
    clear_last_error();

    respond((|| {
        let config = config_for(&required(data_dir, "data_dir")?)?;
        let stream = parse_stream(&required(stream, "stream")?)?;
        let loaded = StreamReader::from_config(&config)
            .load(stream)
            .map_err(|e| e.to_string())?;
        to_json(&views::summarize(&loaded.table))
    })())
}

/// The `n` most frequent values of a field.
///
/// # Safety
/// - `data_dir`, `stream`, and `field` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `journal_free_string`.
/// - Returns NULL on error; call `journal_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn journal_top_n(
    data_dir: *const c_char,
    stream: *const c_char,
    field: *const c_char,
    n: u32,
) -> *mut c_char {
    clear_last_error();

    respond((|| {
        let config = config_for(&required(data_dir, "data_dir")?)?;
        let stream = parse_stream(&required(stream, "stream")?)?;
        let field = required(field, "field")?;
        let loaded = StreamReader::from_config(&config)
            .load(stream)
            .map_err(|e| e.to_string())?;
        let top = views::top_n(&loaded.table, &field, n as usize).map_err(|e| e.to_string())?;
        to_json(&top)
    })())
}

/// Cumulative time series for every stream.
///
/// # Safety
/// - `data_dir` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `journal_free_string`.
/// - Returns NULL on error; call `journal_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn journal_time_series(data_dir: *const c_char) -> *mut c_char {
    clear_last_error();

    respond((|| {
        let config = config_for(&required(data_dir, "data_dir")?)?;
        let loaded = StreamReader::from_config(&config)
            .load_all()
            .map_err(|e| e.to_string())?;
        let tables: Vec<_> = loaded.iter().map(|l| &l.table).collect();
        to_json(&views::time_series(&tables))
    })())
}

/// Outer-join the symptom and emotion severities and correlate them.
///
/// # Safety
/// - `data_dir` must be a valid null-terminated C string.
/// - `bucket_minutes` of 0 joins on exact timestamps; otherwise timestamps are
///   floored to windows of that many minutes.
/// - Returns a newly allocated string that must be freed with `journal_free_string`.
/// - Returns NULL on error; call `journal_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn journal_correlate(
    data_dir: *const c_char,
    bucket_minutes: u32,
) -> *mut c_char {
    clear_last_error();

    respond((|| {
        let config = config_for(&required(data_dir, "data_dir")?)?;
        let alignment = match bucket_minutes {
            0 => Alignment::Exact,
            minutes => Alignment::Bucket {
                width_seconds: i64::from(minutes) * 60,
            },
        };
        let loaded = StreamReader::from_config(&config)
            .load_all()
            .map_err(|e| e.to_string())?;
        let tables: Vec<_> = loaded.iter().map(|l| &l.table).collect();
        to_json(&views::correlate(&tables, alignment))
    })())
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Journal functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Journal function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn journal_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Journal function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn journal_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn journal_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cstring(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null(), "unexpected NULL: {:?}", last_error());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        journal_free_string(ptr);
        s
    }

    unsafe fn last_error() -> Option<String> {
        let err = journal_last_error();
        if err.is_null() {
            None
        } else {
            Some(CStr::from_ptr(err).to_str().unwrap().to_string())
        }
    }

    #[test]
    fn test_ffi_append_and_load() {
        let dir = TempDir::new().unwrap();
        let data_dir = cstring(dir.path().to_str().unwrap());
        let stream = cstring("symptoms");
        let record = cstring(
            r#"{"timestamp": "2024-01-01T09:00:00", "symptom_type": "Headache", "severity": 6, "notes": "  "}"#,
        );

        unsafe {
            assert_eq!(journal_append(data_dir.as_ptr(), stream.as_ptr(), record.as_ptr()), 0);
            assert!(last_error().is_none());

            let json = take_string(journal_load(data_dir.as_ptr(), stream.as_ptr(), 1));
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["schema_version"], 2);
            assert_eq!(value["table"]["rows"][0][1], "Headache");
            assert_eq!(value["table"]["rows"][0][2], 6);
            assert!(value["table"]["rows"][0][3].is_null());
        }
    }

    #[test]
    fn test_ffi_rejects_out_of_range_severity() {
        let dir = TempDir::new().unwrap();
        let data_dir = cstring(dir.path().to_str().unwrap());
        let stream = cstring("emotions");
        let record = cstring(
            r#"{"timestamp": "2024-01-01T09:00:00", "emotion_type": "Anxious", "severity": 11}"#,
        );

        unsafe {
            assert_ne!(journal_append(data_dir.as_ptr(), stream.as_ptr(), record.as_ptr()), 0);
            assert!(last_error().unwrap().contains("between 1 and 10"));
        }
        assert!(!dir.path().join("emotions.csv").exists());
    }

    #[test]
    fn test_ffi_form_and_views() {
        let dir = TempDir::new().unwrap();
        let data_dir = cstring(dir.path().to_str().unwrap());
        let meals = cstring("meals");
        let form = cstring(
            r#"{"date": "2024-01-01", "time": "08:00", "meal_type": "Breakfast", "food_consumed": "eggs"}"#,
        );

        unsafe {
            assert_eq!(journal_append_form(data_dir.as_ptr(), meals.as_ptr(), form.as_ptr()), 0);

            let summary = take_string(journal_summarize(data_dir.as_ptr(), meals.as_ptr()));
            let value: serde_json::Value = serde_json::from_str(&summary).unwrap();
            assert_eq!(value["count"], 1);
            assert_eq!(value["columns"][1]["frequencies"][0]["value"], "Breakfast");

            let field = cstring("meal_type");
            let top = take_string(journal_top_n(data_dir.as_ptr(), meals.as_ptr(), field.as_ptr(), 5));
            assert_eq!(top, r#"[{"value":"Breakfast","count":1}]"#);

            let series = take_string(journal_time_series(data_dir.as_ptr()));
            let value: serde_json::Value = serde_json::from_str(&series).unwrap();
            assert_eq!(value.as_array().unwrap().len(), 3);
            assert_eq!(value[0]["points"][0]["cumulative_count"], 1);

            let correlation = take_string(journal_correlate(data_dir.as_ptr(), 0));
            let value: serde_json::Value = serde_json::from_str(&correlation).unwrap();
            assert_eq!(value["skipped_streams"][0], "meals");
            assert!(value["pairs"][0]["coefficient"].is_null());
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let dir = TempDir::new().unwrap();
        let data_dir = cstring(dir.path().to_str().unwrap());
        let meals = cstring("meals");
        let field = cstring("severity");

        unsafe {
            let result = journal_top_n(data_dir.as_ptr(), meals.as_ptr(), field.as_ptr(), 3);
            assert!(result.is_null());
            assert!(last_error().unwrap().contains("severity"));

            let sleep = cstring("sleep");
            assert!(journal_summarize(data_dir.as_ptr(), sleep.as_ptr()).is_null());
            assert!(last_error().unwrap().contains("Unknown stream"));

            assert!(journal_load(ptr::null(), meals.as_ptr(), 0).is_null());
            assert_eq!(last_error().unwrap(), "Invalid data_dir string pointer");
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = journal_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::JOURNAL_VERSION);
        }
    }
}
