use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "blockar",
    about = "Create and extract blockar archives over standard input and output.",
    version
)]
pub struct Cli {
    /// Report each entry on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(visible_alias = "c", about = "Write an archive of the given files to stdout")]
    Create(CreateArgs),

    #[command(visible_alias = "x", about = "Extract an archive read from stdin")]
    Extract(ExtractArgs),

    #[command(visible_aliases = ["l", "ls"], about = "List the entries of an archive read from stdin")]
    List(ListArgs),
}

#[derive(Debug, clap::Args)]
pub struct CreateArgs {
    /// Regular files to archive, in order
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct ExtractArgs {
    /// Output directory (defaults to current directory)
    #[arg(short = 'C', long = "directory", value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Don't restore modification times
    #[arg(short = 'm', long)]
    pub touch: bool,
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
    /// Output one JSON object per entry
    #[arg(short = 'j', long)]
    pub json: bool,
}
