//! `ome header`: merge submissions and print data-file header text.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use ome::submission;
use ome_core::{MetadataDocument, render_header};

#[derive(Args)]
pub struct HeaderArgs {
    /// Submissions to merge, in order (header text, or canonical `.json`)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run(args: &HeaderArgs) -> Result<()> {
    let docs = submission::load_all(&args.files)?;
    let merged = MetadataDocument::merge(&docs)?;
    let text = render_header(&merged).context("resolve every conflict before rendering a header")?;
    print!("{text}");
    Ok(())
}
