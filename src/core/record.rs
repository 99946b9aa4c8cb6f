//! Parsed per-die measurement records

use serde::{Deserialize, Serialize};

use crate::core::parameter::Parameter;

/// Measured values for one die, one slot per [`Parameter`]
///
/// A slot is `None` when the column was absent from the log or the cell could
/// not be read. NaN is never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    values: [Option<f64>; Parameter::COUNT],
}

impl Measurements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, param: Parameter) -> Option<f64> {
        self.values[param.index()]
    }

    /// Store a value; non-finite input is treated as missing
    pub fn set(&mut self, param: Parameter, value: Option<f64>) {
        self.values[param.index()] = value.filter(|v| v.is_finite());
    }

    pub fn with(mut self, param: Parameter, value: f64) -> Self {
        self.set(param, Some(value));
        self
    }

    /// Iterate over present values in parameter order
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, f64)> + '_ {
        Parameter::all()
            .iter()
            .filter_map(|p| self.get(*p).map(|v| (*p, v)))
    }

    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// One measured die/site from a CP log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// File name the record was read from
    pub source: String,
    pub lot_number: String,
    pub wafer_id: String,
    pub program_name: Option<String>,
    pub test_date: Option<String>,
    /// Value of the `No.U` column
    pub site_id: String,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub bin: Option<u32>,
    pub measurements: Measurements,
}

impl RawRecord {
    /// Minimal record, mostly for building fixtures
    pub fn new(lot_number: impl Into<String>, wafer_id: impl Into<String>, site_id: impl Into<String>) -> Self {
        Self {
            source: String::new(),
            lot_number: lot_number.into(),
            wafer_id: wafer_id.into(),
            program_name: None,
            test_date: None,
            site_id: site_id.into(),
            x: None,
            y: None,
            bin: None,
            measurements: Measurements::new(),
        }
    }

    pub fn with_value(mut self, param: Parameter, value: f64) -> Self {
        self.measurements.set(param, Some(value));
        self
    }

    pub fn value(&self, param: Parameter) -> Option<f64> {
        self.measurements.get(param)
    }

    /// Die coordinate pair when both X and Y were reported
    pub fn coordinates(&self) -> Option<(i32, i32)> {
        self.x.zip(self.y)
    }
}
