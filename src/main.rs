use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

use cpa::cli::{verbosity_filter, Cli, Commands};

/// Log to stderr; RUST_LOG takes precedence over -v
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity_filter(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        None => cpa::cli::commands::report::run(cli.report),
        Some(Commands::Report(args)) => cpa::cli::commands::report::run(args),
        Some(Commands::Stats(args)) => cpa::cli::commands::stats::run(args),
        Some(Commands::Check(args)) => cpa::cli::commands::check::run(args),
    }
}
