//! `cpa stats` command - Print grouped statistics to the terminal

use console::style;
use miette::Result;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::args::AnalysisArgs;
use crate::cli::helpers::print_load_summary;
use crate::core::group::GroupKey;
use crate::pipeline;
use crate::report::{format_pct, format_stat, ParameterSection, NOT_AVAILABLE};

/// Render one parameter's table
pub fn stats_table(section: &ParameterSection, group_by: GroupKey) -> String {
    let with_limits = section.has_limits();
    let mut builder = Builder::default();

    let mut header = vec![group_by.label(), "Count", "Mean", "StdDev", "Min", "Max"];
    if with_limits {
        header.extend(["Yield", "Cp", "Cpk"]);
    }
    builder.push_record(header);

    for row in &section.stats {
        let s = &row.stats;
        let mut record = vec![
            row.group.clone(),
            s.count.to_string(),
            format_stat(s.mean),
            format_stat(s.stddev),
            format_stat(s.min),
            format_stat(s.max),
        ];
        if with_limits {
            let cap = section.capability_for(&row.group);
            record.push(format_pct(section.yield_for(&row.group).and_then(|y| y.yield_pct)));
            record.push(format_stat(cap.and_then(|c| c.cp)));
            record.push(format_stat(cap.and_then(|c| c.cpk)));
        }
        builder.push_record(record);
    }

    let o = &section.overall;
    let mut overall = vec![
        "Overall".to_string(),
        o.count.to_string(),
        format_stat(o.mean),
        format_stat(o.stddev),
        format_stat(o.min),
        format_stat(o.max),
    ];
    if with_limits {
        overall.push(format_pct(section.overall_yield()));
        overall.push(NOT_AVAILABLE.to_string());
        overall.push(NOT_AVAILABLE.to_string());
    }
    builder.push_record(overall);

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

pub fn run(args: AnalysisArgs) -> Result<()> {
    let config = args.resolve()?;
    let outcome = pipeline::load_logs(&config)?;
    print_load_summary(&outcome, &config.data_dir);
    pipeline::ensure_data(&outcome)?;

    let (_, sections) = pipeline::analyze(&config, &outcome);
    for section in &sections {
        println!();
        let unit = section.parameter.unit();
        if unit.is_empty() {
            println!("{}", style(section.parameter).bold());
        } else {
            println!("{} ({})", style(section.parameter).bold(), unit);
        }
        if section.has_limits() {
            println!(
                "  LSL: {}   USL: {}",
                format_stat(section.limits.lower),
                format_stat(section.limits.upper)
            );
        }
        if !section.has_data() {
            println!("  {}", style("No data").dim());
            continue;
        }
        println!("{}", stats_table(section, config.group_by));
    }
    Ok(())
}
