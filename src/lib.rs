//! CP Analyzer - circuit-probe test log parsing, grouped statistics and reports
//!
//! Library layout:
//! - [`parser`]: log discovery and parsing into [`core::RawRecord`]s
//! - [`core`]: parameters, grouping, statistics, limits and configuration
//! - [`report`]: Plotly charts, HTML pages, CSV and JSON export
//! - [`pipeline`]: the explicit-config path from a data directory to reports

pub mod cli;
pub mod core;
pub mod parser;
pub mod pipeline;
pub mod report;

pub use crate::core::{AnalysisConfig, Parameter, ParameterSelection, RawRecord};
pub use crate::parser::{ParseError, ParsedLog, RowPolicy};
pub use crate::pipeline::{run, PipelineError};
