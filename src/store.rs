//! Flat-file expense store: a JSON array of `{timestamp, string}` records.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Returned by [`RecordStore::filter_by_range`] when the store file is absent.
pub const NO_DATA: &str = "No data found.";
/// Returned by [`RecordStore::filter_by_range`] when nothing falls in the range.
pub const NO_ENTRIES: &str = "No entries found within the specified time range.";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One logged expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Local ISO-8601 time the record was stored.
    pub timestamp: String,
    /// Normalized `ITEM:AMOUNT` text, stored as given.
    pub string: String,
}

impl ExpenseRecord {
    /// Create a record stamped with the current local time.
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string(),
            string: text.into(),
        }
    }

    pub fn parsed_timestamp(&self) -> Result<NaiveDateTime, StoreError> {
        parse_iso(&self.timestamp)
    }
}

/// Inclusive `[start, end]` window, parsed from `"start, end"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}

impl FromStr for TimeRange {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        let [start, end] = parts.as_slice() else {
            return Err(StoreError::TimeRange(format!(
                "expected 'start, end' but got {} part(s) in '{s}'",
                parts.len()
            )));
        };
        Ok(Self {
            start: parse_iso(start)?,
            end: parse_iso(end)?,
        })
    }
}

/// Alternate date-time layouts: space separator, or no seconds.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Parse an ISO-8601 date-time (`T` or space separated, optional seconds and
/// fraction) or a bare date.
fn parse_iso(raw: &str) -> Result<NaiveDateTime, StoreError> {
    let raw = raw.trim();
    if let Ok(dt) = raw.parse::<NaiveDateTime>() {
        return Ok(dt);
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Ok(dt);
    }
    raw.parse::<NaiveDate>()
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| StoreError::TimeRange(format!("invalid ISO-8601 timestamp '{raw}'")))
}

#[derive(Debug)]
pub enum StoreError {
    Io { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    TimeRange(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to access store '{}': {}", path.display(), source)
            }
            Self::Parse { path, source } => {
                write!(f, "store '{}' is not a JSON array of records: {}", path.display(), source)
            }
            Self::TimeRange(msg) => write!(f, "invalid time range: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::TimeRange(_) => None,
        }
    }
}

/// Append-only record store backed by a single JSON file.
///
/// Appends rewrite the whole array through a temp file and a rename, so
/// readers only ever see a complete array. The mutex serializes writers
/// within this process; separate processes sharing the file are not
/// coordinated.
pub struct RecordStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stamp `text` with the current time and append it.
    pub fn append(&self, text: &str) -> Result<ExpenseRecord, StoreError> {
        let record = ExpenseRecord::now(text);
        self.append_record(record.clone())?;
        Ok(record)
    }

    /// Append an already-stamped record.
    pub fn append_record(&self, record: ExpenseRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut records = self.read_records()?.unwrap_or_default();
        records.push(record);
        self.write_atomic(&records)?;

        info!("Stored record #{} in {}", records.len(), self.path.display());
        Ok(())
    }

    /// All records in insertion order; a missing file is an empty store.
    pub fn load_all(&self) -> Result<Vec<ExpenseRecord>, StoreError> {
        Ok(self.read_records()?.unwrap_or_default())
    }

    /// Records within `range` ("start, end", both inclusive) as pretty JSON,
    /// or one of the [`NO_DATA`] / [`NO_ENTRIES`] sentinels.
    pub fn filter_by_range(&self, range: &str) -> Result<String, StoreError> {
        let range: TimeRange = range.parse()?;

        let Some(records) = self.read_records()? else {
            return Ok(NO_DATA.to_string());
        };

        let mut matching = Vec::new();
        for record in records {
            if range.contains(record.parsed_timestamp()?) {
                matching.push(record);
            }
        }
        debug!("{} record(s) between {} and {}", matching.len(), range.start, range.end);

        if matching.is_empty() {
            return Ok(NO_ENTRIES.to_string());
        }
        serde_json::to_string_pretty(&matching).map_err(|e| StoreError::Parse {
            path: self.path.clone(),
            source: e,
        })
    }

    /// `None` when the file does not exist.
    fn read_records(&self) -> Result<Option<Vec<ExpenseRecord>>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Parse {
                path: self.path.clone(),
                source: e,
            })
    }

    fn write_atomic(&self, records: &[ExpenseRecord]) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let json = to_json_indent4(records).map_err(|e| StoreError::Parse {
            path: self.path.clone(),
            source: e,
        })?;

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let mut file = fs::File::create(&tmp_path).map_err(io_err)?;
        file.write_all(&json).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(io_err)
    }
}

fn to_json_indent4(records: &[ExpenseRecord]) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    records.serialize(&mut ser)?;
    Ok(out)
}

/// Full history as 4-space indented JSON, the shape the query prompt embeds.
pub fn records_as_context(records: &[ExpenseRecord]) -> String {
    to_json_indent4(records)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_else(|_| "[]".to_string())
}
