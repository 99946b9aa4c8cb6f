//! CP log parsing and discovery

pub mod diagnostics;
pub mod discover;
pub mod log;
pub mod value;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use diagnostics::{MissingValueWarning, ParseError, RowError};
pub use discover::{discover_logs, has_table_header, is_cp_log, is_log_file};
pub use log::{Column, LogData, LogHeader, ParsedLog, ParsedRow};
pub use value::{parse_limit, parse_value, CellValue};

/// What to do with a data row shorter than the table header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// The whole file fails on its first malformed row
    Strict,
    /// Malformed rows are skipped and reported
    #[default]
    Lenient,
}

/// Read a log; bytes that are not UTF-8 are replaced rather than rejected
pub fn read_log(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Display name of a log for records and messages
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
