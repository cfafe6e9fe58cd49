use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ome::config::{CONFIG_ENV, DEFAULT_CONFIG_FILE, OmeConfig};

mod check;
mod header_cmd;
mod merge_cmd;
mod telemetry;

/// Merge OME cruise metadata submissions
///
/// Several submissions describing the same cruise (data-file headers or
/// canonical JSON trees) are folded into one document. Disagreements are
/// never resolved silently: every disputed field keeps all of its values,
/// shows up as %%CONFLICT%% in the canonical tree and is listed in the
/// conflict report.
///
/// Submissions naming different cruises are never merged.
///
/// QUICK START:
///
///   ome merge a.txt b.txt --format text
///   ome merge a.txt b.json --out merged/
///   ome check merged/merged.json
///   ome header merged/merged.json
#[derive(Parser)]
#[command(name = "ome")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'ome <command> --help' for more information on a specific command.")]
struct Cli {
    /// Configuration file (default: ./ome.toml; missing file means defaults)
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge submissions and report every conflict
    Merge(merge_cmd::MergeArgs),

    /// Check one submission for conflicts and acceptance
    ///
    /// Exits non-zero when the submission is not acceptable.
    Check(check::CheckArgs),

    /// Merge submissions and print the result as data-file header text
    ///
    /// Fails if any field is still in dispute.
    Header(header_cmd::HeaderArgs),
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = OmeConfig::load(&config_path).context("failed to load configuration")?;

    match cli.command {
        Commands::Merge(args) => merge_cmd::run(&args, &config),
        Commands::Check(args) => check::run(&args, &config),
        Commands::Header(args) => header_cmd::run(&args),
    }
}
