//! `cpa report` command - Generate reports (also the default command)

use console::style;
use miette::Result;

use crate::cli::args::ReportArgs;
use crate::cli::helpers::{display_path, print_load_summary};
use crate::pipeline::{self, PipelineError};

pub fn run(args: ReportArgs) -> Result<()> {
    let config = args.resolve()?;

    println!(
        "{} Reading logs from {}",
        style("→").blue(),
        style(config.data_dir.display()).cyan()
    );
    let outcome = pipeline::load_logs(&config)?;
    print_load_summary(&outcome, &config.data_dir);
    pipeline::ensure_data(&outcome)?;

    let summary = outcome.summary();
    let (agg, sections) = pipeline::analyze(&config, &outcome);
    println!(
        "{} Grouped {} record(s) by {} into {} group(s)",
        style("→").blue(),
        agg.record_count(),
        config.group_by,
        agg.group_count()
    );

    for section in sections.iter().filter(|s| !s.has_data()) {
        println!(
            "{} {} has no values in any parsed log",
            style("!").yellow(),
            section.parameter
        );
    }

    let written = pipeline::write_reports(&config, &sections, &summary).map_err(PipelineError::from)?;
    for path in &written {
        println!("{} {}", style("✓").green(), display_path(path, &config.output_dir));
    }
    println!(
        "\n{} Wrote {} {} file(s) to {}",
        style("✓").green(),
        written.len(),
        config.format,
        config.output_dir.display()
    );
    Ok(())
}
