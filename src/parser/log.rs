//! CP tester log parsing
//!
//! A log has a free-form preamble of `keyword<TAB>value` header lines, then a
//! tab-separated table introduced by a `No.U` header row. Optional `LimitU` /
//! `LimitL` rows and bias/condition rows sit between the table header and the
//! first data row; data rows start with an integer die number.

use crate::core::limits::{LimitTable, SpecLimits};
use crate::core::parameter::Parameter;
use crate::core::record::RawRecord;
use crate::parser::diagnostics::{MissingValueWarning, ParseError, RowError};
use crate::parser::value::{parse_limit, parse_value, CellValue};
use crate::parser::RowPolicy;

pub const KEY_PROGRAM: &str = "Program name";
pub const KEY_LOT: &str = "Lot number";
pub const KEY_WAFER: &str = "Wafer number";
pub const KEY_DATE: &str = "Date";
pub const KEY_TIME: &str = "Time";
pub const TABLE_MARKER: &str = "No.U";
pub const LIMIT_UPPER: &str = "LimitU";
pub const LIMIT_LOWER: &str = "LimitL";

/// Header fields read from the preamble
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogHeader {
    pub program_name: Option<String>,
    pub lot_number: String,
    pub wafer_id: String,
    pub test_date: Option<String>,
    pub test_time: Option<String>,
}

/// Meaning of one table column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Site,
    X,
    Y,
    Bin,
    Param(Parameter),
    Unmapped(String),
}

/// A validated log whose rows are read on demand
///
/// Construction checks the header and table layout; [`ParsedLog::rows`] walks
/// the retained content again on every call.
#[derive(Debug, Clone)]
pub struct ParsedLog {
    source: String,
    content: String,
    header: LogHeader,
    columns: Vec<Column>,
    /// Fields a data row must have: one per header column
    required_width: usize,
    limits: LimitTable,
    /// 0-based line index of the first data row
    data_start: Option<usize>,
}

/// One data row turned into a record
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub record: RawRecord,
    pub warnings: Vec<MissingValueWarning>,
}

/// All records of a log after applying a [`RowPolicy`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogData {
    pub records: Vec<RawRecord>,
    pub warnings: Vec<MissingValueWarning>,
    pub skipped_rows: Vec<RowError>,
}

fn fields(line: &str) -> impl Iterator<Item = &str> {
    line.split('\t').map(str::trim)
}

fn first_field(line: &str) -> &str {
    fields(line).next().unwrap_or("")
}

fn is_data_row(line: &str) -> bool {
    let first = first_field(line);
    !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit())
}

/// Value of a `keyword<whitespace>value` header line, if `line` is one
fn header_value<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}

fn read_header(preamble: &[&str]) -> Result<LogHeader, ParseError> {
    let find = |keyword: &str| -> Option<String> {
        preamble
            .iter()
            .find_map(|line| header_value(line, keyword))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    Ok(LogHeader {
        program_name: find(KEY_PROGRAM),
        lot_number: find(KEY_LOT).ok_or(ParseError::MissingHeaderField { field: KEY_LOT })?,
        wafer_id: find(KEY_WAFER).ok_or(ParseError::MissingHeaderField { field: KEY_WAFER })?,
        test_date: find(KEY_DATE),
        test_time: find(KEY_TIME),
    })
}

fn map_columns(header_line: &str) -> Vec<Column> {
    let mut seen: Vec<Parameter> = Vec::new();
    let mut columns: Vec<Column> = fields(header_line)
        .enumerate()
        .map(|(i, name)| match name {
            _ if i == 0 => Column::Site,
            "X" => Column::X,
            "Y" => Column::Y,
            "Bin" | "BIN" => Column::Bin,
            _ => match Parameter::from_column(name) {
                Some(p) if !seen.contains(&p) => {
                    seen.push(p);
                    Column::Param(p)
                }
                _ => Column::Unmapped(name.to_string()),
            },
        })
        .collect();

    // Trailing tabs in the header produce empty names that mean nothing
    while matches!(columns.last(), Some(Column::Unmapped(name)) if name.is_empty()) {
        columns.pop();
    }
    columns
}

impl ParsedLog {
    /// Validate `content` and locate its table
    ///
    /// `source` names the file in records and messages.
    pub fn parse(content: &str, source: impl Into<String>) -> Result<Self, ParseError> {
        // Windows exports may start with a byte order mark
        let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);
        let lines: Vec<&str> = content.lines().collect();

        let header_idx = lines
            .iter()
            .position(|line| first_field(line) == TABLE_MARKER)
            .ok_or(ParseError::MissingTableHeader)?;

        let header = read_header(&lines[..header_idx])?;
        let columns = map_columns(lines[header_idx]);

        if !columns.iter().any(|c| matches!(c, Column::Param(_))) {
            let names: Vec<&str> = fields(lines[header_idx]).collect();
            return Err(ParseError::NoParameterColumns {
                columns: names.join(", "),
            });
        }

        let required_width = columns.len();

        let mut upper = [None; Parameter::COUNT];
        let mut lower = [None; Parameter::COUNT];
        let mut data_start = None;

        for (idx, line) in lines.iter().enumerate().skip(header_idx + 1) {
            if line.trim().is_empty() {
                continue;
            }
            if is_data_row(line) {
                data_start = Some(idx);
                break;
            }
            let target = match first_field(line) {
                LIMIT_UPPER => &mut upper,
                LIMIT_LOWER => &mut lower,
                // Bias and condition rows carry nothing we report
                _ => continue,
            };
            for (col, cell) in columns.iter().zip(fields(line)) {
                if let Column::Param(p) = col {
                    target[p.index()] = parse_limit(cell).value();
                }
            }
        }

        let mut limits = LimitTable::new();
        for p in Parameter::all() {
            limits.set(*p, SpecLimits::new(lower[p.index()], upper[p.index()]));
        }

        Ok(Self {
            source: source.into(),
            content: content.to_string(),
            header,
            columns,
            required_width,
            limits,
            data_start,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn header(&self) -> &LogHeader {
        &self.header
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Limits declared by the `LimitU` / `LimitL` rows
    pub fn limits(&self) -> &LimitTable {
        &self.limits
    }

    /// Parameters this log has a column for
    pub fn parameters(&self) -> Vec<Parameter> {
        self.columns
            .iter()
            .filter_map(|c| match c {
                Column::Param(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Columns that were ignored
    pub fn unmapped_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| match c {
                Column::Unmapped(name) if !name.is_empty() => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Iterate over data rows; restartable, each call reads from the top
    pub fn rows(&self) -> Rows<'_> {
        let start = self.data_start.unwrap_or(usize::MAX);
        Rows {
            log: self,
            lines: self.content.lines().enumerate().skip(start),
            done: self.data_start.is_none(),
        }
    }

    /// Records of every well-formed row, skipping malformed ones
    pub fn records(&self) -> impl Iterator<Item = RawRecord> + '_ {
        self.rows().filter_map(Result::ok).map(|row| row.record)
    }

    /// Materialize all rows under `policy`
    ///
    /// `Strict` turns the first malformed row into an error for the whole
    /// file; `Lenient` skips it. Unreadable cells never abort.
    pub fn load(&self, policy: RowPolicy) -> Result<LogData, ParseError> {
        let mut data = LogData::default();
        for row in self.rows() {
            match row {
                Ok(row) => {
                    data.warnings.extend(row.warnings);
                    data.records.push(row.record);
                }
                Err(err) => match policy {
                    RowPolicy::Strict => return Err(ParseError::MalformedRow(err)),
                    RowPolicy::Lenient => data.skipped_rows.push(err),
                },
            }
        }
        Ok(data)
    }

    fn build_row(&self, line_no: usize, line: &str) -> Result<ParsedRow, RowError> {
        let cells: Vec<&str> = fields(line).collect();
        if cells.len() < self.required_width {
            return Err(RowError {
                line: line_no,
                expected: self.required_width,
                found: cells.len(),
            });
        }

        let mut record = RawRecord {
            source: self.source.clone(),
            lot_number: self.header.lot_number.clone(),
            wafer_id: self.header.wafer_id.clone(),
            program_name: self.header.program_name.clone(),
            test_date: self.header.test_date.clone(),
            site_id: String::new(),
            x: None,
            y: None,
            bin: None,
            measurements: Default::default(),
        };
        let mut warnings = Vec::new();

        for (col, cell) in self.columns.iter().zip(cells.iter().copied()) {
            match col {
                Column::Site => record.site_id = cell.to_string(),
                Column::X => record.x = cell.parse().ok(),
                Column::Y => record.y = cell.parse().ok(),
                Column::Bin => record.bin = cell.parse().ok(),
                Column::Param(p) => match parse_value(cell) {
                    CellValue::Value(v) => record.measurements.set(*p, Some(v)),
                    CellValue::Empty => {}
                    CellValue::Invalid => warnings.push(MissingValueWarning {
                        line: line_no,
                        column: p.to_string(),
                        raw: cell.to_string(),
                    }),
                },
                Column::Unmapped(_) => {}
            }
        }

        Ok(ParsedRow { record, warnings })
    }
}

/// Iterator over the data rows of a [`ParsedLog`]
///
/// Blank lines are skipped; the first non-blank line that is not a data row
/// ends the table.
pub struct Rows<'a> {
    log: &'a ParsedLog,
    lines: std::iter::Skip<std::iter::Enumerate<std::str::Lines<'a>>>,
    done: bool,
}

impl<'a> Iterator for Rows<'a> {
    type Item = Result<ParsedRow, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        for (idx, line) in self.lines.by_ref() {
            if line.trim().is_empty() {
                continue;
            }
            if !is_data_row(line) {
                self.done = true;
                return None;
            }
            return Some(self.log.build_row(idx + 1, line));
        }
        self.done = true;
        None
    }
}
