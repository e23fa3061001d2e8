use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Command, RootArgs};

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    let config = cpe_pattern::config::resolve_config(args.config.as_deref())?;
    tracing::debug!(?config, "resolved config");

    match args.command {
        Command::Pattern(cmd) => commands::run_pattern(cmd, &config),
        Command::Query(cmd) => commands::run_query(cmd, &config),
        Command::Normalize(cmd) => commands::run_normalize(cmd, &config),
        Command::Config(cmd) => commands::run_config(cmd, &config),
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
