//! Shared helper functions for CLI commands

use std::path::Path;

use console::style;

use crate::pipeline::LoadOutcome;

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Show `path` relative to `base` when it lies below it
pub fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// File and record counts shown after reading logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadCounts {
    pub parsed: usize,
    pub failed: usize,
    pub records: usize,
    pub warnings: usize,
    pub skipped_rows: usize,
}

impl LoadCounts {
    pub fn from_outcome(outcome: &LoadOutcome) -> Self {
        Self {
            parsed: outcome.files_parsed,
            failed: outcome.failed.len(),
            records: outcome.records.len(),
            warnings: outcome.warnings,
            skipped_rows: outcome.skipped_rows,
        }
    }

    pub fn found(&self) -> usize {
        self.parsed + self.failed
    }
}

/// Print a rule followed by the file and record counts
pub fn print_counts(counts: &LoadCounts) {
    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "Files: {} found, {} parsed, {} failed",
        counts.found(),
        style(counts.parsed).green(),
        if counts.failed == 0 {
            style(counts.failed).dim()
        } else {
            style(counts.failed).red()
        }
    );
    println!(
        "Records: {}   Warnings: {}   Skipped rows: {}",
        style(counts.records).cyan(),
        if counts.warnings > 0 {
            style(counts.warnings).yellow()
        } else {
            style(counts.warnings).dim()
        },
        counts.skipped_rows
    );
}

/// Print the input summary: parsed and failed files, record and warning counts
pub fn print_load_summary(outcome: &LoadOutcome, data_dir: &Path) {
    print_counts(&LoadCounts::from_outcome(outcome));
    for (path, err) in &outcome.failed {
        println!(
            "  {} {} - {}",
            style("✗").red(),
            display_path(path, data_dir),
            truncate_str(&err.to_string(), 100)
        );
    }
    println!("{}", style("─".repeat(60)).dim());
}
