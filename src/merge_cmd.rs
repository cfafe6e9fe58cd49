//! `ome merge`: fold submissions into one document and report conflicts.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use ome::config::OmeConfig;
use ome::format::OutputFormat;
use ome::submission;
use ome::summary::{MergeSummary, merge_text};
use ome_core::MetadataDocument;

#[derive(Args)]
pub struct MergeArgs {
    /// Submissions to merge, in order (header text, or canonical `.json`)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format: json or text (default from config, else json)
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Also write `merged.json` and `merged.conflicts.json` into this directory
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Fail when the merged document still has conflicts
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: &MergeArgs, config: &OmeConfig) -> Result<()> {
    let format = args.format.unwrap_or(config.output.format);
    let docs = submission::load_all(&args.files)?;

    let mut merged = MetadataDocument::merge(&docs)?;
    if docs.len() > 1 {
        let policy = config.acceptance.policy();
        merged.set_draft(!merged.is_acceptable_with(&policy));
    }

    if let Some(dir) = &args.out {
        let (canonical, report) = submission::write_merged(dir, &merged)?;
        tracing::info!(
            canonical = %canonical.display(),
            report = %report.display(),
            "merge written"
        );
    }

    let summary = MergeSummary::new(docs.len(), &merged);
    match format {
        OutputFormat::Json => println!("{}", format.serialize(&summary)?),
        OutputFormat::Text => print!("{}", merge_text(&summary, &merged.to_conflict_report())),
    }

    if (args.strict || config.merge.strict) && merged.has_conflict() {
        bail!(
            "{} unresolved conflict(s) remain (strict mode)",
            merged.conflict_count()
        );
    }
    Ok(())
}
