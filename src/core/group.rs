//! Grouping dimensions for aggregation

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::record::RawRecord;

/// Group label used when the projected field is absent from a record
pub const UNKNOWN_GROUP: &str = "UNKNOWN";

/// Field a record is grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    #[default]
    LotNumber,
    WaferId,
    Source,
    ProgramName,
    TestDate,
    Bin,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown group-by field: '{name}' (expected lot_number, wafer_id, source, program_name, test_date or bin)")]
pub struct InvalidGroupKeyError {
    pub name: String,
}

impl GroupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::LotNumber => "lot_number",
            GroupKey::WaferId => "wafer_id",
            GroupKey::Source => "source",
            GroupKey::ProgramName => "program_name",
            GroupKey::TestDate => "test_date",
            GroupKey::Bin => "bin",
        }
    }

    /// Column heading for report tables
    pub fn label(&self) -> &'static str {
        match self {
            GroupKey::LotNumber => "Lot",
            GroupKey::WaferId => "Wafer",
            GroupKey::Source => "File",
            GroupKey::ProgramName => "Program",
            GroupKey::TestDate => "Date",
            GroupKey::Bin => "Bin",
        }
    }

    /// Project the grouping value off a record
    pub fn key_of(&self, record: &RawRecord) -> String {
        let value = match self {
            GroupKey::LotNumber => Some(record.lot_number.clone()),
            GroupKey::WaferId => Some(record.wafer_id.clone()),
            GroupKey::Source => Some(record.source.clone()),
            GroupKey::ProgramName => record.program_name.clone(),
            GroupKey::TestDate => record.test_date.clone(),
            GroupKey::Bin => record.bin.map(|b| b.to_string()),
        };
        match value {
            Some(v) if !v.is_empty() => v,
            _ => UNKNOWN_GROUP.to_string(),
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GroupKey {
    type Err = InvalidGroupKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lot_number" | "lot" => Ok(GroupKey::LotNumber),
            "wafer_id" | "wafer" | "wafer_number" => Ok(GroupKey::WaferId),
            "source" | "file_name" | "file" => Ok(GroupKey::Source),
            "program_name" | "program" => Ok(GroupKey::ProgramName),
            "test_date" | "date" => Ok(GroupKey::TestDate),
            "bin" => Ok(GroupKey::Bin),
            _ => Err(InvalidGroupKeyError { name: s.to_string() }),
        }
    }
}
