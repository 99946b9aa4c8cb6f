//! Report generation: charts, HTML pages and tabular exports

pub mod chart;
pub mod export;
pub mod html;

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::core::aggregate::{Aggregation, GroupStats};
use crate::core::capability::{capability_by_group, yield_by_group, Capability, YieldStats};
use crate::core::limits::SpecLimits;
use crate::core::parameter::Parameter;
use crate::core::stats::ParameterStats;

pub use chart::{quartiles_by_group, BoxSummary, ChartData, GroupQuartiles};
pub use export::{write_csv, write_json};
pub use html::{write_html, ReportGenerator};

/// Text for a value that cannot be computed
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Template error: {0}")]
    Template(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Format a statistic for display; undefined values become `N/A`
pub fn format_stat(value: Option<f64>) -> String {
    match value {
        None => NOT_AVAILABLE.to_string(),
        Some(v) if v == 0.0 => "0".to_string(),
        Some(v) if (1e-2..1e5).contains(&v.abs()) => format!("{:.4}", v),
        Some(v) => format!("{:.4e}", v),
    }
}

/// Format a percentage with two decimals, or `N/A`
pub fn format_pct(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{:.2}%", v))
}

/// A log that could not be used
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// What the input stage produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub files_parsed: usize,
    pub failed: Vec<FailedFile>,
    pub records: usize,
    pub warnings: usize,
    pub skipped_rows: usize,
}

/// Everything reported for one parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSection {
    pub parameter: Parameter,
    pub limits: SpecLimits,
    pub stats: Vec<GroupStats>,
    pub overall: ParameterStats,
    pub yields: Vec<YieldStats>,
    pub capability: Vec<Capability>,
    pub quartiles: Vec<GroupQuartiles>,
    pub overall_quartiles: Option<BoxSummary>,
    #[serde(skip)]
    pub chart: Option<ChartData>,
}

impl ParameterSection {
    pub fn build(agg: &Aggregation, param: Parameter, limits: SpecLimits) -> Self {
        Self {
            parameter: param,
            limits,
            stats: agg.table(param),
            overall: agg.overall(param),
            yields: yield_by_group(agg, param, &limits),
            capability: capability_by_group(agg, param, &limits),
            quartiles: quartiles_by_group(agg, param),
            overall_quartiles: BoxSummary::from_sorted(&agg.sorted_values_all(param)),
            chart: ChartData::collect(agg, param, limits),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.overall.is_empty()
    }

    pub fn has_limits(&self) -> bool {
        !self.limits.is_empty()
    }

    pub fn yield_for(&self, group: &str) -> Option<&YieldStats> {
        self.yields.iter().find(|y| y.group == group)
    }

    pub fn capability_for(&self, group: &str) -> Option<&Capability> {
        self.capability.iter().find(|c| c.group == group)
    }

    pub fn quartiles_for(&self, group: &str) -> Option<&BoxSummary> {
        self.quartiles.iter().find(|q| q.group == group).map(|q| &q.summary)
    }

    /// Yield over every group combined
    pub fn overall_yield(&self) -> Option<f64> {
        let (total, passed) = self
            .yields
            .iter()
            .fold((0, 0), |(t, p), y| (t + y.total, p + y.passed));
        (total > 0).then(|| passed as f64 / total as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::aggregate;
    use crate::core::group::GroupKey;
    use crate::core::parameter::ParameterSelection;
    use crate::core::record::RawRecord;

    #[test]
    fn test_section_quartiles() {
        let records: Vec<RawRecord> = [("L1", 1.0), ("L1", 3.0), ("L2", 2.0), ("L2", 4.0), ("L2", 6.0)]
            .iter()
            .enumerate()
            .map(|(i, (lot, v))| RawRecord::new(*lot, "W01", i.to_string()).with_value(Parameter::Vth, *v))
            .collect();
        let agg = aggregate(&records, &ParameterSelection::All, GroupKey::LotNumber);
        let section = ParameterSection::build(&agg, Parameter::Vth, SpecLimits::default());

        assert_eq!(section.quartiles_for("L1").unwrap().median, 2.0);
        assert_eq!(section.quartiles_for("L2").unwrap().q3, 5.0);
        let overall = section.overall_quartiles.unwrap();
        assert_eq!((overall.min, overall.median, overall.max), (1.0, 3.0, 6.0));

        let empty = ParameterSection::build(&agg, Parameter::Bvdss1, SpecLimits::default());
        assert!(empty.quartiles.is_empty());
        assert!(empty.overall_quartiles.is_none());
    }

    #[test]
    fn test_format_stat() {
        assert_eq!(format_stat(None), "N/A");
        assert_eq!(format_stat(Some(0.0)), "0");
        assert_eq!(format_stat(Some(651.0)), "651.0000");
        assert_eq!(format_stat(Some(1.131370849898476)), "1.1314");
        assert_eq!(format_stat(Some(1.2e-8)), "1.2000e-8");
        assert_eq!(format_stat(Some(-3.5)), "-3.5000");
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct(None), "N/A");
        assert_eq!(format_pct(Some(66.6666)), "66.67%");
    }
}
