//! End-to-end analysis: discover, parse, aggregate, report
//!
//! Every stage takes an [`AnalysisConfig`] explicitly. The CLI drives the
//! stages one by one so it can print the input summary before any report is
//! written; [`run`] chains them for library callers.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::aggregate::{aggregate, Aggregation};
use crate::core::config::{AnalysisConfig, ConfigError, OutputFormat};
use crate::core::group::InvalidGroupKeyError;
use crate::core::limits::LimitTable;
use crate::core::parameter::InvalidParameterError;
use crate::core::record::RawRecord;
use crate::parser::{discover_logs, read_log, source_name, LogData, ParseError, ParsedLog, RowPolicy};
use crate::report::{self, FailedFile, ParameterSection, ReportError, RunSummary};

/// Why a single log could not be used
#[derive(Debug, Error, Diagnostic)]
pub enum LogError {
    #[error("Failed to read log: {0}")]
    #[diagnostic(code(cpa::io::read))]
    Read(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error("Cannot use data directory {path}: {source}")]
    #[diagnostic(code(cpa::io::data_dir), help("pass --data-dir or set data_dir in the config file"))]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        #[diagnostic_source]
        source: LogError,
    },

    #[error("No log file parsed successfully ({found} found, {failed} failed)")]
    #[diagnostic(code(cpa::pipeline::no_data))]
    NoData { found: usize, failed: usize },

    #[error(transparent)]
    #[diagnostic(code(cpa::report))]
    Report(#[from] ReportError),

    #[error(transparent)]
    #[diagnostic(code(cpa::config))]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(code(cpa::config::parameter))]
    InvalidParameter(#[from] InvalidParameterError),

    #[error(transparent)]
    #[diagnostic(code(cpa::config::group_by))]
    InvalidGroupKey(#[from] InvalidGroupKeyError),
}

/// One log after parsing and row materialization
#[derive(Debug, Clone)]
pub struct LoadedLog {
    pub log: ParsedLog,
    pub data: LogData,
}

/// Read and parse one file
pub fn load_log(path: &Path, policy: RowPolicy) -> Result<LoadedLog, LogError> {
    let content = read_log(path)?;
    let log = ParsedLog::parse(&content, source_name(path))?;
    let data = log.load(policy)?;
    Ok(LoadedLog { log, data })
}

/// Records and diagnostics of every discovered log
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub records: Vec<RawRecord>,
    /// Limits from the logs, first file to declare one wins
    pub limits: LimitTable,
    pub files_parsed: usize,
    pub failed: Vec<(PathBuf, LogError)>,
    pub warnings: usize,
    pub skipped_rows: usize,
}

impl LoadOutcome {
    pub fn files_found(&self) -> usize {
        self.files_parsed + self.failed.len()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            files_parsed: self.files_parsed,
            failed: self
                .failed
                .iter()
                .map(|(path, err)| FailedFile {
                    path: path.clone(),
                    reason: err.to_string(),
                })
                .collect(),
            records: self.records.len(),
            warnings: self.warnings,
            skipped_rows: self.skipped_rows,
        }
    }

    /// Log limits with configured overrides applied
    pub fn effective_limits(&self, overrides: &LimitTable) -> LimitTable {
        let mut limits = self.limits.clone();
        limits.apply_overrides(overrides);
        limits
    }
}

/// Discover and parse every log under `config.data_dir`
///
/// Files are visited in sorted order. A file that fails is recorded and
/// skipped, unless `config.fail_fast` is set.
pub fn load_logs(config: &AnalysisConfig) -> Result<LoadOutcome, PipelineError> {
    let paths = discover_logs(&config.data_dir).map_err(|source| PipelineError::DataDir {
        path: config.data_dir.clone(),
        source,
    })?;
    info!(dir = %config.data_dir.display(), files = paths.len(), "discovered logs");

    let mut outcome = LoadOutcome::default();
    for path in paths {
        match load_log(&path, config.row_policy) {
            Ok(loaded) => {
                for warning in &loaded.data.warnings {
                    warn!(file = %path.display(), "{}", warning);
                }
                for row in &loaded.data.skipped_rows {
                    warn!(file = %path.display(), "skipped malformed row, {}", row);
                }
                debug!(
                    file = %path.display(),
                    records = loaded.data.records.len(),
                    unmapped = ?loaded.log.unmapped_columns(),
                    "parsed log"
                );
                outcome.limits.absorb_first_seen(loaded.log.limits());
                outcome.warnings += loaded.data.warnings.len();
                outcome.skipped_rows += loaded.data.skipped_rows.len();
                outcome.files_parsed += 1;
                outcome.records.extend(loaded.data.records);
            }
            Err(err) => {
                warn!(file = %path.display(), "{}", err);
                if config.fail_fast {
                    return Err(PipelineError::Log { path, source: err });
                }
                outcome.failed.push((path, err));
            }
        }
    }
    Ok(outcome)
}

/// Aggregate loaded records and assemble one section per selected parameter
pub fn analyze(config: &AnalysisConfig, outcome: &LoadOutcome) -> (Aggregation, Vec<ParameterSection>) {
    let agg = aggregate(&outcome.records, &config.parameters, config.group_by);
    let limits = outcome.effective_limits(&config.limit_overrides);
    let sections = agg
        .parameters()
        .iter()
        .map(|p| ParameterSection::build(&agg, *p, limits.get(*p)))
        .collect();
    (agg, sections)
}

/// Write the artifacts selected by `config.format`
pub fn write_reports(
    config: &AnalysisConfig,
    sections: &[ParameterSection],
    summary: &RunSummary,
) -> Result<Vec<PathBuf>, ReportError> {
    match config.format {
        OutputFormat::Html => report::write_html(sections, config.group_by, summary, &config.output_dir),
        OutputFormat::Csv => report::write_csv(sections, &config.output_dir),
        OutputFormat::Json => report::write_json(sections, config.group_by, summary, &config.output_dir),
    }
}

/// Fail when nothing usable was read
pub fn ensure_data(outcome: &LoadOutcome) -> Result<(), PipelineError> {
    if outcome.files_parsed == 0 {
        return Err(PipelineError::NoData {
            found: outcome.files_found(),
            failed: outcome.failed.len(),
        });
    }
    Ok(())
}

/// Result of a complete run
#[derive(Debug)]
pub struct RunOutput {
    pub summary: RunSummary,
    pub sections: Vec<ParameterSection>,
    pub written: Vec<PathBuf>,
}

/// Run the whole analysis and write reports
pub fn run(config: &AnalysisConfig) -> Result<RunOutput, PipelineError> {
    let outcome = load_logs(config)?;
    ensure_data(&outcome)?;
    let summary = outcome.summary();
    let (_, sections) = analyze(config, &outcome);
    let written = write_reports(config, &sections, &summary)?;
    info!(files = written.len(), dir = %config.output_dir.display(), "reports written");
    Ok(RunOutput {
        summary,
        sections,
        written,
    })
}
