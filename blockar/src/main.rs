mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    let cli = match Cli::try_parse_from(wild::args_os()) {
        Ok(v) => v,
        Err(e) => {
            // Help and version requests succeed; anything else is a usage error.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // Standard output may carry archive data, so logs always go to stderr.
    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Create(args) => commands::create(args)?,
        Commands::Extract(args) => commands::extract(args)?,
        Commands::List(args) => commands::list(args)?,
    };

    Ok(())
}
