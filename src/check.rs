//! `ome check`: acceptance and conflict listing for one submission.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use ome::config::OmeConfig;
use ome::format::OutputFormat;
use ome::submission;
use ome::summary::{CheckSummary, check_text};

#[derive(Args)]
pub struct CheckArgs {
    /// Submission to check (header text, or canonical `.json`)
    pub file: PathBuf,

    /// Output format: json or text (default from config, else json)
    #[arg(long)]
    pub format: Option<OutputFormat>,
}

pub fn run(args: &CheckArgs, config: &OmeConfig) -> Result<()> {
    let format = args.format.unwrap_or(config.output.format);
    let doc = submission::load(&args.file)?;

    let summary = CheckSummary::new(&doc, &config.acceptance.policy());
    match format {
        OutputFormat::Json => println!("{}", format.serialize(&summary)?),
        OutputFormat::Text => print!("{}", check_text(&summary, &doc.to_conflict_report())),
    }

    if !summary.acceptable {
        bail!("{} is not acceptable", args.file.display());
    }
    Ok(())
}
