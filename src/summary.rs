//! Command output: the JSON payloads and their plain-text renderings.

use std::fmt::Write as _;

use ome_core::{AcceptancePolicy, ConflictReport, MetadataDocument};
use serde::Serialize;
use serde_json::Value;

/// Result of `ome merge`.
#[derive(Debug, Serialize)]
pub struct MergeSummary {
    pub documents: usize,
    pub draft: bool,
    pub conflict_count: usize,
    pub canonical: Value,
    pub conflicts: Value,
}

impl MergeSummary {
    #[must_use]
    pub fn new(documents: usize, merged: &MetadataDocument) -> Self {
        Self {
            documents,
            draft: merged.is_draft(),
            conflict_count: merged.conflict_count(),
            canonical: merged.to_canonical(),
            conflicts: merged.to_conflict_report().to_tree(),
        }
    }
}

/// Result of `ome check`.
#[derive(Debug, Serialize)]
pub struct CheckSummary {
    pub cruise_id: String,
    pub acceptable: bool,
    pub draft: bool,
    pub issues: Vec<String>,
    pub conflicts: Value,
}

impl CheckSummary {
    #[must_use]
    pub fn new(doc: &MetadataDocument, policy: &AcceptancePolicy) -> Self {
        let issues = doc.acceptance_issues(policy);
        Self {
            cruise_id: doc.value("cruise_id").to_owned(),
            acceptable: issues.is_empty(),
            draft: doc.is_draft(),
            issues,
            conflicts: doc.to_conflict_report().to_tree(),
        }
    }
}

/// One line per disputed field: `path [identity]: "a" | "b"`.
#[must_use]
pub fn conflict_lines(report: &ConflictReport) -> String {
    let mut out = String::new();
    for entry in &report.entries {
        let _ = write!(out, "  {}", entry.path.join("/"));
        if !entry.record.is_empty() {
            let identity: Vec<String> = entry
                .record
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            let _ = write!(out, " [{}]", identity.join(", "));
        }
        let values: Vec<String> = entry.values.iter().map(|v| format!("{v:?}")).collect();
        let _ = writeln!(out, ": {}", values.join(" | "));
    }
    out
}

/// Plain-text rendering of a merge.
#[must_use]
pub fn merge_text(summary: &MergeSummary, report: &ConflictReport) -> String {
    let mut out = format!(
        "Merged {} document(s): {} conflict(s){}\n",
        summary.documents,
        summary.conflict_count,
        if summary.draft { ", draft" } else { "" }
    );
    out.push_str(&conflict_lines(report));
    out
}

/// Plain-text rendering of a check.
#[must_use]
pub fn check_text(summary: &CheckSummary, report: &ConflictReport) -> String {
    let cruise = if summary.cruise_id.is_empty() {
        "(no cruise id)"
    } else {
        summary.cruise_id.as_str()
    };
    let verdict = if summary.acceptable {
        "acceptable"
    } else {
        "not acceptable"
    };
    let mut out = format!("{cruise}: {verdict}\n");
    for issue in &summary.issues {
        let _ = writeln!(out, "- {issue}");
    }
    if !report.is_empty() {
        out.push_str("Conflicts:\n");
        out.push_str(&conflict_lines(report));
    }
    out
}
