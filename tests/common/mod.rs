//! Shared test helpers for integration tests
//!
//! Fixture logs follow the tester layout: header block, `No.U` table header,
//! limit rows, then one row per die.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use assert_cmd::cargo;
use assert_cmd::Command;
use tempfile::TempDir;

/// Helper to get a cpa command
pub fn cpa() -> Command {
    Command::new(cargo::cargo_bin!("cpa"))
}

/// Builder for a synthetic CP log
#[derive(Debug, Clone)]
pub struct LogFixture {
    pub lot: Option<String>,
    pub wafer: Option<String>,
    pub program: String,
    pub columns: Vec<String>,
    pub upper: Vec<String>,
    pub lower: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl LogFixture {
    /// A log with `X`, `Y`, `Bin` and the given parameter columns
    pub fn new(lot: &str, wafer: &str, params: &[&str]) -> Self {
        Self {
            lot: Some(lot.to_string()),
            wafer: Some(wafer.to_string()),
            program: "PRG-650V".to_string(),
            columns: params.iter().map(|p| p.to_string()).collect(),
            upper: Vec::new(),
            lower: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn without_lot(mut self) -> Self {
        self.lot = None;
        self
    }

    /// Limit cells in parameter-column order; empty strings leave a side unset
    pub fn limits(mut self, lower: &[&str], upper: &[&str]) -> Self {
        self.lower = lower.iter().map(|s| s.to_string()).collect();
        self.upper = upper.iter().map(|s| s.to_string()).collect();
        self
    }

    /// One die; cells in parameter-column order
    pub fn row(mut self, cells: &[&str]) -> Self {
        let die = self.rows.len() + 1;
        let mut row = vec![die.to_string(), (die % 10).to_string(), (die / 10).to_string(), "1".to_string()];
        row.extend(cells.iter().map(|c| c.to_string()));
        self.rows.push(row);
        self
    }

    /// A die with a raw, possibly truncated, field list after `No.U`
    pub fn raw_row(mut self, fields: &[&str]) -> Self {
        let die = self.rows.len() + 1;
        let mut row = vec![die.to_string()];
        row.extend(fields.iter().map(|c| c.to_string()));
        self.rows.push(row);
        self
    }

    /// Dies with a single value each
    pub fn values(self, values: &[f64]) -> Self {
        values.iter().fold(self, |fixture, v| fixture.row(&[&v.to_string()]))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        writeln!(out, "Program name\t{}", self.program).unwrap();
        if let Some(lot) = &self.lot {
            writeln!(out, "Lot number\t{}", lot).unwrap();
        }
        if let Some(wafer) = &self.wafer {
            writeln!(out, "Wafer number\t{}", wafer).unwrap();
        }
        writeln!(out, "Date\t2024-03-01").unwrap();
        writeln!(out, "Time\t10:22:31").unwrap();
        writeln!(out).unwrap();
        writeln!(out, "No.U\tX\tY\tBin\t{}", self.columns.join("\t")).unwrap();
        if !self.upper.is_empty() {
            writeln!(out, "LimitU\t\t\t\t{}", self.upper.join("\t")).unwrap();
        }
        if !self.lower.is_empty() {
            writeln!(out, "LimitL\t\t\t\t{}", self.lower.join("\t")).unwrap();
        }
        writeln!(out, "Bias1\t\t\t\t{}", vec!["250uA"; self.columns.len()].join("\t")).unwrap();
        for row in &self.rows {
            writeln!(out, "{}", row.join("\t")).unwrap();
        }
        out
    }

    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.render()).unwrap();
        path
    }
}

/// A data directory with two lots across three wafers
///
/// L1: 650.2, 651.8 (W01) and 650.0 (W02); L2: 648.0 (W03).
pub fn setup_data_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("data");
    std::fs::create_dir_all(&data).unwrap();

    LogFixture::new("L1", "W01", &["BVDSS1", "VTH"])
        .limits(&["600", "2.0"], &["700", "4.0"])
        .row(&["650.2", "3.1"])
        .row(&["651.8", "3.3"])
        .write(&data, "L1_W01.txt");
    LogFixture::new("L1", "W02", &["BVDSS1", "VTH"])
        .row(&["650.0", "3.0"])
        .write(&data, "L1_W02.txt");
    LogFixture::new("L2", "W03", &["BVDSS1", "VTH"])
        .row(&["648.0", "-"])
        .write(&data, "L2_W03.txt");
    tmp
}

pub fn data_dir(tmp: &TempDir) -> PathBuf {
    tmp.path().join("data")
}

pub fn output_dir(tmp: &TempDir) -> PathBuf {
    tmp.path().join("out")
}

/// Relative comparison for statistics
pub fn rel_close(actual: f64, expected: f64, tol: f64) -> bool {
    if expected == 0.0 {
        actual.abs() < tol
    } else {
        ((actual - expected) / expected).abs() < tol
    }
}
