//! CSV and JSON output formats

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::core::group::GroupKey;
use crate::core::parameter::Parameter;
use crate::report::{ParameterSection, ReportError, RunSummary};

pub const SUMMARY_FILE: &str = "summary.json";

pub fn stats_file_name(param: Parameter) -> String {
    format!("{}_stats.csv", param)
}

pub fn yield_file_name(param: Parameter) -> String {
    format!("{}_yield.csv", param)
}

/// Undefined values are written as empty cells
#[derive(Debug, Serialize)]
struct StatsRow<'a> {
    group: &'a str,
    count: usize,
    mean: Option<f64>,
    stddev: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
    q1: Option<f64>,
    median: Option<f64>,
    q3: Option<f64>,
}

#[derive(Debug, Serialize)]
struct YieldRow<'a> {
    group: &'a str,
    total: usize,
    passed: usize,
    failed: usize,
    yield_pct: Option<f64>,
    lsl: Option<f64>,
    usl: Option<f64>,
    cp: Option<f64>,
    cpk: Option<f64>,
}

fn write_stats_csv(section: &ParameterSection, path: &Path) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in &section.stats {
        let quartiles = section.quartiles_for(&row.group);
        writer.serialize(StatsRow {
            group: &row.group,
            count: row.stats.count,
            mean: row.stats.mean,
            stddev: row.stats.stddev,
            min: row.stats.min,
            max: row.stats.max,
            q1: quartiles.map(|b| b.q1),
            median: quartiles.map(|b| b.median),
            q3: quartiles.map(|b| b.q3),
        })?;
    }
    let o = &section.overall;
    writer.serialize(StatsRow {
        group: "Overall",
        count: o.count,
        mean: o.mean,
        stddev: o.stddev,
        min: o.min,
        max: o.max,
        q1: section.overall_quartiles.map(|b| b.q1),
        median: section.overall_quartiles.map(|b| b.median),
        q3: section.overall_quartiles.map(|b| b.q3),
    })?;
    writer.flush().map_err(|e| ReportError::io(path, e))
}

fn write_yield_csv(section: &ParameterSection, path: &Path) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for y in &section.yields {
        let cap = section.capability_for(&y.group);
        writer.serialize(YieldRow {
            group: &y.group,
            total: y.total,
            passed: y.passed,
            failed: y.failed,
            yield_pct: y.yield_pct,
            lsl: section.limits.lower,
            usl: section.limits.upper,
            cp: cap.and_then(|c| c.cp),
            cpk: cap.and_then(|c| c.cpk),
        })?;
    }
    writer.flush().map_err(|e| ReportError::io(path, e))
}

/// Write `{PARAM}_stats.csv` and `{PARAM}_yield.csv` for every section
pub fn write_csv(sections: &[ParameterSection], output_dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    std::fs::create_dir_all(output_dir).map_err(|e| ReportError::io(output_dir, e))?;
    let mut written = Vec::with_capacity(sections.len() * 2);
    for section in sections {
        let stats_path = output_dir.join(stats_file_name(section.parameter));
        write_stats_csv(section, &stats_path)?;
        written.push(stats_path);

        let yield_path = output_dir.join(yield_file_name(section.parameter));
        write_yield_csv(section, &yield_path)?;
        written.push(yield_path);
    }
    Ok(written)
}

#[derive(Debug, Serialize)]
struct SummaryDocument<'a> {
    generated: String,
    group_by: &'a str,
    summary: &'a RunSummary,
    parameters: &'a [ParameterSection],
}

/// Write a single `summary.json` covering every section
pub fn write_json(
    sections: &[ParameterSection],
    group_by: GroupKey,
    summary: &RunSummary,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, ReportError> {
    std::fs::create_dir_all(output_dir).map_err(|e| ReportError::io(output_dir, e))?;
    let doc = SummaryDocument {
        generated: Local::now().to_rfc3339(),
        group_by: group_by.as_str(),
        summary,
        parameters: sections,
    };
    let json = serde_json::to_string_pretty(&doc)?;
    let path = output_dir.join(SUMMARY_FILE);
    std::fs::write(&path, json).map_err(|e| ReportError::io(&path, e))?;
    Ok(vec![path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::aggregate;
    use crate::core::limits::SpecLimits;
    use crate::core::parameter::ParameterSelection;
    use crate::core::record::RawRecord;
    use crate::report::FailedFile;
    use tempfile::tempdir;

    fn section(limits: SpecLimits) -> ParameterSection {
        let records = vec![
            RawRecord::new("L1", "W01", "1").with_value(Parameter::Bvdss1, 650.2),
            RawRecord::new("L1", "W01", "2").with_value(Parameter::Bvdss1, 651.8),
            RawRecord::new("L2", "W02", "1").with_value(Parameter::Bvdss1, 648.0),
        ];
        let agg = aggregate(&records, &ParameterSelection::default(), GroupKey::LotNumber);
        ParameterSection::build(&agg, Parameter::Bvdss1, limits)
    }

    #[test]
    fn test_csv_files() {
        let tmp = tempdir().unwrap();
        let written = write_csv(&[section(SpecLimits::new(Some(649.0), None))], tmp.path()).unwrap();
        assert_eq!(written.len(), 2);

        let stats = std::fs::read_to_string(tmp.path().join("BVDSS1_stats.csv")).unwrap();
        let lines: Vec<&str> = stats.lines().collect();
        assert_eq!(lines[0], "group,count,mean,stddev,min,max,q1,median,q3");
        assert!(lines[1].starts_with("L1,2,651"));
        // Single value: stddev is an empty cell
        assert_eq!(lines[2], "L2,1,648.0,,648.0,648.0,648.0,648.0,648.0");
        assert!(lines[3].starts_with("Overall,3,"));

        let yields = std::fs::read_to_string(tmp.path().join("BVDSS1_yield.csv")).unwrap();
        let lines: Vec<&str> = yields.lines().collect();
        assert_eq!(lines[0], "group,total,passed,failed,yield_pct,lsl,usl,cp,cpk");
        assert!(lines[1].starts_with("L1,2,2,0,100.0,649.0,,"));
        assert!(lines[2].starts_with("L2,1,0,1,0.0,649.0,,"));
    }

    #[test]
    fn test_json_summary() {
        let tmp = tempdir().unwrap();
        let summary = RunSummary {
            files_parsed: 2,
            failed: vec![FailedFile {
                path: PathBuf::from("bad.txt"),
                reason: "Missing required header field 'Lot number'".into(),
            }],
            records: 3,
            warnings: 0,
            skipped_rows: 0,
        };
        write_json(&[section(SpecLimits::default())], GroupKey::LotNumber, &summary, tmp.path()).unwrap();

        let text = std::fs::read_to_string(tmp.path().join(SUMMARY_FILE)).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["group_by"], "lot_number");
        assert_eq!(doc["summary"]["failed"][0]["path"], "bad.txt");
        let param = &doc["parameters"][0];
        assert_eq!(param["parameter"], "BVDSS1");
        assert_eq!(param["stats"][0]["group"], "L1");
        assert_eq!(param["stats"][1]["stats"]["stddev"], serde_json::Value::Null);
        assert_eq!(param["overall"]["count"], 3);
        assert!(param["capability"].as_array().unwrap().is_empty());
        assert_eq!(param["quartiles"][0]["group"], "L1");
        assert_eq!(param["quartiles"][0]["median"], 651.0);
        assert_eq!(param["overall_quartiles"]["median"], 650.2);
    }
}
