//! `cpa check` command - Parse every log and report which ones are usable

use console::style;
use miette::Result;

use crate::cli::args::CheckArgs;
use crate::cli::helpers::{display_path, print_counts, LoadCounts};
use crate::parser::discover_logs;
use crate::pipeline::{load_log, PipelineError};

pub fn run(args: CheckArgs) -> Result<()> {
    let config = args.resolve()?;
    let paths = discover_logs(&config.data_dir).map_err(|source| PipelineError::DataDir {
        path: config.data_dir.clone(),
        source,
    })?;

    println!(
        "{} Checking {} file(s) in {}...\n",
        style("→").blue(),
        paths.len(),
        config.data_dir.display()
    );

    let mut counts = LoadCounts::default();
    for path in &paths {
        let name = display_path(path, &config.data_dir);
        match load_log(path, config.row_policy) {
            Ok(loaded) => {
                counts.parsed += 1;
                counts.records += loaded.data.records.len();
                counts.warnings += loaded.data.warnings.len();
                counts.skipped_rows += loaded.data.skipped_rows.len();

                let header = loaded.log.header();
                let mut notes = Vec::new();
                if !loaded.data.warnings.is_empty() {
                    notes.push(format!("{} warning(s)", loaded.data.warnings.len()));
                }
                if !loaded.data.skipped_rows.is_empty() {
                    notes.push(format!("{} skipped row(s)", loaded.data.skipped_rows.len()));
                }
                println!(
                    "{} {} - lot {}, wafer {}, {} record(s){}",
                    style("✓").green(),
                    name,
                    header.lot_number,
                    header.wafer_id,
                    loaded.data.records.len(),
                    if notes.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", notes.join(", "))
                    }
                );
            }
            Err(e) => {
                counts.failed += 1;
                println!("{} {} - {}", style("✗").red(), name, e);
            }
        }
    }

    print_counts(&counts);

    if counts.failed > 0 {
        return Err(miette::miette!(
            "{} of {} file(s) failed to parse",
            counts.failed,
            counts.found()
        ));
    }
    if counts.found() == 0 {
        return Err(PipelineError::NoData { found: 0, failed: 0 }.into());
    }

    println!("\n{} All files parsed", style("✓").green());
    Ok(())
}
