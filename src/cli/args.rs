//! Command-line arguments

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use miette::Result;

use crate::core::config::{AnalysisConfig, OutputFormat};
use crate::core::limits::SpecLimits;
use crate::core::parameter::ParameterSelection;
use crate::parser::RowPolicy;
use crate::pipeline::PipelineError;

#[derive(Parser, Debug)]
#[command(name = "cpa")]
#[command(author, version, about = "CP wafer test log analyzer", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Report generation (used when no subcommand is given)
    #[command(flatten)]
    pub report: ReportArgs,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate reports (the default)
    Report(ReportArgs),

    /// Print grouped statistics to the terminal without writing files
    Stats(AnalysisArgs),

    /// Parse every log and report which ones are usable
    Check(CheckArgs),
}

/// Options shared by every analysis command
#[derive(clap::Args, Debug, Clone, Default)]
pub struct AnalysisArgs {
    /// Directory of CP log files [default: ./data/data2/rawdata]
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Parameter to report, repeatable, or "all" [default: BVDSS1]
    #[arg(short, long = "parameter", value_name = "NAME")]
    pub parameters: Vec<String>,

    /// Report every parameter
    #[arg(long, conflicts_with = "parameters")]
    pub all_parameters: bool,

    /// Field to group by: lot_number, wafer_id, source, program_name, test_date, bin [default: lot_number]
    #[arg(short, long, value_name = "FIELD")]
    pub group_by: Option<String>,

    /// Lower specification limit for the selected parameter
    #[arg(long, value_name = "F", allow_negative_numbers = true)]
    pub lower: Option<f64>,

    /// Upper specification limit for the selected parameter
    #[arg(long, value_name = "F", allow_negative_numbers = true)]
    pub upper: Option<f64>,

    /// Fail a file on its first malformed row instead of skipping the row
    #[arg(long)]
    pub strict: bool,

    /// Abort on the first file that fails to parse
    #[arg(long)]
    pub fail_fast: bool,

    /// YAML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ReportArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Directory reports are written to [default: ./output]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format [default: html]
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Directory of CP log files [default: ./data/data2/rawdata]
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Treat malformed rows as file failures
    #[arg(long)]
    pub strict: bool,

    /// YAML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

fn base_config(path: Option<&PathBuf>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_file(path).map_err(|e| PipelineError::from(e).into()),
        None => Ok(AnalysisConfig::default()),
    }
}

impl AnalysisArgs {
    /// Defaults, then the config file, then these flags
    ///
    /// Parameter and group names are validated here, before any log is read.
    pub fn resolve(&self) -> Result<AnalysisConfig> {
        let mut config = base_config(self.config.as_ref())?;

        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if self.all_parameters {
            config.parameters = ParameterSelection::All;
        } else if !self.parameters.is_empty() {
            config.parameters = ParameterSelection::from_names(self.parameters.as_slice()).map_err(PipelineError::from)?;
        }
        if let Some(group_by) = &self.group_by {
            config.group_by = group_by.parse().map_err(PipelineError::from)?;
        }
        if self.strict {
            config.row_policy = RowPolicy::Strict;
        }
        if self.fail_fast {
            config.fail_fast = true;
        }

        if self.lower.is_some() || self.upper.is_some() {
            let ParameterSelection::One(param) = config.parameters else {
                return Err(miette::miette!(
                    help = "select a single parameter with -p",
                    "--lower/--upper apply to exactly one parameter"
                ));
            };
            let current = config.limit_overrides.get(param);
            config
                .limit_overrides
                .set(param, current.overridden_by(&SpecLimits::new(self.lower, self.upper)));
        }

        Ok(config)
    }
}

impl ReportArgs {
    pub fn resolve(&self) -> Result<AnalysisConfig> {
        let mut config = self.analysis.resolve()?;
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        Ok(config)
    }
}

impl CheckArgs {
    pub fn resolve(&self) -> Result<AnalysisConfig> {
        let mut config = base_config(self.config.as_ref())?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if self.strict {
            config.row_policy = RowPolicy::Strict;
        }
        Ok(config)
    }
}

/// Log filter directive for a `-v` count
pub fn verbosity_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::group::GroupKey;
    use crate::core::parameter::Parameter;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_without_subcommand() {
        let cli = Cli::try_parse_from(["cpa"]).unwrap();
        assert!(cli.command.is_none());
        let config = cli.report.resolve().unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_flags_override() {
        let cli = Cli::try_parse_from([
            "cpa", "--data-dir", "logs", "-p", "vth", "-g", "wafer", "--strict", "--format", "json", "--lower", "-1.5",
        ])
        .unwrap();
        let config = cli.report.resolve().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("logs"));
        assert_eq!(config.parameters, ParameterSelection::One(Parameter::Vth));
        assert_eq!(config.group_by, GroupKey::WaferId);
        assert_eq!(config.row_policy, RowPolicy::Strict);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.limit_overrides.get(Parameter::Vth).lower, Some(-1.5));
    }

    #[test]
    fn test_invalid_parameter() {
        let cli = Cli::try_parse_from(["cpa", "-p", "BVDSS9"]).unwrap();
        let err = cli.report.resolve().unwrap_err();
        assert!(err.to_string().contains("BVDSS9"));
    }

    #[test]
    fn test_limits_need_single_parameter() {
        let cli = Cli::try_parse_from(["cpa", "--all-parameters", "--upper", "5"]).unwrap();
        assert!(cli.report.resolve().is_err());
    }

    #[test]
    fn test_subcommands() {
        let cli = Cli::try_parse_from(["cpa", "stats", "-p", "IDSS1", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(matches!(cli.command, Some(Commands::Stats(_))));

        let cli = Cli::try_parse_from(["cpa", "check", "--data-dir", "x"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check(_))));
    }

    #[test]
    fn test_verbosity_filter() {
        assert_eq!(verbosity_filter(0), "warn");
        assert_eq!(verbosity_filter(2), "debug");
        assert_eq!(verbosity_filter(9), "trace");
    }
}
