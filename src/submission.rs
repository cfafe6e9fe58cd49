//! Reading submissions from disk and writing merge results back.
//!
//! A submission is either a canonical JSON tree (`*.json`, with an optional
//! sibling `<stem>.conflicts.json` conflict report) or data-file header text
//! (any other extension).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ome_core::{ConflictReport, MetadataDocument, parse_header};

/// Suffix of the conflict report written next to a canonical tree.
pub const CONFLICTS_SUFFIX: &str = ".conflicts.json";

/// File stem used by [`write_merged`].
pub const MERGED_STEM: &str = "merged";

/// Path of the conflict report that belongs to the canonical tree at `path`.
#[must_use]
pub fn conflicts_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{CONFLICTS_SUFFIX}"))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load one submission.
///
/// # Errors
/// Fails when the file (or its conflict report) cannot be read or parsed.
pub fn load(path: &Path) -> Result<MetadataDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;

    if !is_json(path) {
        let doc = parse_header(&text)
            .with_context(|| format!("invalid header in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded header submission");
        return Ok(doc);
    }

    let tree: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;

    let report_path = conflicts_path(path);
    let report = if report_path.is_file() {
        let raw = std::fs::read_to_string(&report_path)
            .with_context(|| format!("could not read {}", report_path.display()))?;
        let report: ConflictReport = serde_json::from_str(&raw)
            .with_context(|| format!("invalid conflict report {}", report_path.display()))?;
        Some(report)
    } else {
        None
    };

    let doc = MetadataDocument::from_canonical(&tree, report.as_ref())
        .with_context(|| format!("could not restore {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        conflicts = report.as_ref().map_or(0, ConflictReport::len),
        "loaded canonical submission"
    );
    Ok(doc)
}

/// Load every submission in order.
///
/// # Errors
/// Fails on the first file that cannot be loaded.
pub fn load_all(paths: &[PathBuf]) -> Result<Vec<MetadataDocument>> {
    paths.iter().map(|p| load(p)).collect()
}

/// Write `doc` as `merged.json` plus `merged.conflicts.json` under `dir`,
/// creating `dir` if needed. Returns the two paths written.
///
/// # Errors
/// Fails when the directory or either file cannot be written.
pub fn write_merged(dir: &Path, doc: &MetadataDocument) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("could not create {}", dir.display()))?;

    let canonical_path = dir.join(format!("{MERGED_STEM}.json"));
    let report_path = conflicts_path(&canonical_path);

    let canonical = serde_json::to_string_pretty(&doc.to_canonical())?;
    std::fs::write(&canonical_path, canonical + "\n")
        .with_context(|| format!("could not write {}", canonical_path.display()))?;

    let report = serde_json::to_string_pretty(&doc.to_conflict_report())?;
    std::fs::write(&report_path, report + "\n")
        .with_context(|| format!("could not write {}", report_path.display()))?;

    Ok((canonical_path, report_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "expocode=33HQ20110517\nvessel_name=Healy\n";

    #[test]
    fn conflicts_path_sits_next_to_tree() {
        assert_eq!(
            conflicts_path(Path::new("/tmp/a/cruise.json")),
            PathBuf::from("/tmp/a/cruise.conflicts.json")
        );
    }

    #[test]
    fn non_json_is_header_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cruise.txt");
        std::fs::write(&path, HEADER).unwrap();
        let doc = load(&path).unwrap();
        assert_eq!(doc.value("vessel_name"), "Healy");
    }

    #[test]
    fn written_results_load_back_with_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = MetadataDocument::with_cruise_id("33HQ20110517");
        doc.add_value("vessel_name", "Healy").unwrap();
        doc.add_value("vessel_name", "Polarstern").unwrap();

        let (canonical, report) = write_merged(dir.path(), &doc).unwrap();
        assert!(report.ends_with("merged.conflicts.json"));

        let back = load(&canonical).unwrap();
        assert_eq!(
            back.field("vessel_name").unwrap().all_values(),
            ["Healy", "Polarstern"]
        );
    }

    #[test]
    fn errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
