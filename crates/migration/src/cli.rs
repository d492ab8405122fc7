use std::path::PathBuf;

use clap::Parser;
use sea_orm_cli::MigrateSubcommands;

/// Grading database schema migrations.
#[derive(Parser)]
#[clap(about, version)]
pub(crate) struct Cli {
    /// Path to the TOML configuration file, defaults to `Config.toml`.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Migration to run, applies every pending migration if omitted.
    #[clap(subcommand)]
    pub command: Option<MigrateSubcommands>,
}
