//! Parse errors and warnings with user-facing diagnostics

use miette::Diagnostic;
use thiserror::Error;

/// A log file that does not match the expected layout
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ParseError {
    #[error("Missing required header field '{field}'")]
    #[diagnostic(
        code(cpa::parse::missing_header),
        help("the header block before the No.U table must contain a 'keyword<TAB>value' line for this field")
    )]
    MissingHeaderField { field: &'static str },

    #[error("No measurement table header (a line starting with 'No.U') found")]
    #[diagnostic(code(cpa::parse::missing_table))]
    MissingTableHeader,

    #[error("Table header maps none of the known parameters (columns: {columns})")]
    #[diagnostic(
        code(cpa::parse::no_parameters),
        help("expected at least one of BVDSS1, BVDSS2, DELTABV, IDSS1, VTH, RDSON1, VFSDS, IGSS2, IGSSR2, IDSS2")
    )]
    NoParameterColumns { columns: String },

    #[error("Line {}: row has {} field(s), table needs at least {}", .0.line, .0.found, .0.expected)]
    #[diagnostic(
        code(cpa::parse::malformed_row),
        help("rerun without --strict to skip malformed rows")
    )]
    MalformedRow(RowError),
}

/// A data row too short for the table header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-based line number
    pub line: usize,
    pub expected: usize,
    pub found: usize,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: {} field(s), expected at least {}",
            self.line, self.found, self.expected
        )
    }
}

/// An unreadable cell that was recorded as missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingValueWarning {
    /// 1-based line number
    pub line: usize,
    pub column: String,
    pub raw: String,
}

impl std::fmt::Display for MissingValueWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: column {} has non-numeric value '{}', treated as missing",
            self.line, self.column, self.raw
        )
    }
}
