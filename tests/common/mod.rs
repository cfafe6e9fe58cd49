//! Shared test helpers for ome integration tests.
//!
//! All tests use temp directories and run the built `ome` binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

pub const SUBMISSION_A: &str = "\
expocode=33HQ20110517
vessel_name=Healy
platform_type=Ship
investigator[
name=J. Doe
email=j@x.org
]
";

pub const SUBMISSION_B: &str = "\
expocode=33HQ20110517
vessel_name=Healy
platform_type=Research Vessel
investigator[
name=J. Doe
email=j@x.org
phone=555-1111
]
";

/// A temp directory holding the two sample submissions as `a.txt` and `b.txt`.
pub fn setup_submissions() -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    write(dir.path(), "a.txt", SUBMISSION_A);
    write(dir.path(), "b.txt", SUBMISSION_B);
    dir
}

pub fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write test file");
    path
}

/// Run ome in `dir` with a clean environment for config and logging.
pub fn ome_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ome"))
        .args(args)
        .current_dir(dir)
        .env_remove("OME_CONFIG")
        .env_remove("OME_LOG_FORMAT")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute ome")
}

/// Run ome and assert it succeeds. Returns stdout as string.
pub fn ome_ok(dir: &Path, args: &[&str]) -> String {
    let out = ome_in(dir, args);
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        out.status.success(),
        "ome {} failed:\nstdout: {stdout}\nstderr: {stderr}",
        args.join(" "),
    );
    stdout.to_string()
}

/// Run ome and assert it fails. Returns stderr as string.
pub fn ome_fails(dir: &Path, args: &[&str]) -> String {
    let out = ome_in(dir, args);
    assert!(
        !out.status.success(),
        "Expected ome {} to fail, but it succeeded.\nstdout: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stdout),
    );
    String::from_utf8_lossy(&out.stderr).to_string()
}

/// Parse stdout as JSON.
pub fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("output should be valid JSON")
}
