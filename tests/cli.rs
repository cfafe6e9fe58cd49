mod common;
use common::*;

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

#[test]
fn merge_reports_conflicts_as_json() {
    let dir = setup_submissions();
    let out = json(&ome_ok(dir.path(), &["merge", "a.txt", "b.txt"]));

    assert_eq!(out["documents"], 2);
    assert_eq!(out["conflict_count"], 1);
    assert_eq!(out["draft"], true);
    assert_eq!(
        out["canonical"]["Cruise_Info"]["Experiment"]["Platform_Type"],
        "%%CONFLICT%%"
    );
    assert_eq!(out["canonical"]["Investigator"][0]["phone"], "555-1111");
    assert_eq!(
        out["conflicts"]["Conflict"]["Cruise_Info"]["Experiment"]["Platform_Type"],
        serde_json::json!(["Ship", "Research Vessel"])
    );
}

#[test]
fn merge_text_lists_each_conflict() {
    let dir = setup_submissions();
    let out = ome_ok(dir.path(), &["merge", "a.txt", "b.txt", "--format", "text"]);
    assert!(out.starts_with("Merged 2 document(s): 1 conflict(s), draft\n"), "{out}");
    assert!(out.contains("Cruise_Info/Experiment/Platform_Type: \"Ship\" | \"Research Vessel\""));
}

#[test]
fn merge_rejects_different_cruises() {
    let dir = setup_submissions();
    write(
        dir.path(),
        "other.txt",
        &SUBMISSION_B.replace("33HQ20110517", "06AQ19990101"),
    );
    let stderr = ome_fails(dir.path(), &["merge", "a.txt", "other.txt"]);
    assert!(stderr.contains("cruise identity mismatch"), "{stderr}");
    assert!(stderr.contains("Cruise_Info/Experiment/Cruise/Cruise_ID"), "{stderr}");
}

#[test]
fn strict_merge_fails_on_conflicts() {
    let dir = setup_submissions();
    let stderr = ome_fails(dir.path(), &["merge", "a.txt", "b.txt", "--strict"]);
    assert!(stderr.contains("1 unresolved conflict(s)"), "{stderr}");

    ome_ok(dir.path(), &["merge", "a.txt", "a.txt", "--strict"]);
}

#[test]
fn merge_output_loads_back_as_a_submission() {
    let dir = setup_submissions();
    ome_ok(dir.path(), &["merge", "a.txt", "b.txt", "--out", "result"]);

    let canonical = dir.path().join("result/merged.json");
    let report = dir.path().join("result/merged.conflicts.json");
    assert!(canonical.is_file());
    assert!(report.is_file());

    let again = json(&ome_ok(
        dir.path(),
        &["merge", "result/merged.json", "a.txt"],
    ));
    assert_eq!(again["conflict_count"], 1);
    assert_eq!(
        again["conflicts"]["Conflict"]["Cruise_Info"]["Experiment"]["Platform_Type"],
        serde_json::json!(["Ship", "Research Vessel"])
    );
}

#[test]
fn merge_reports_bad_header_line() {
    let dir = setup_submissions();
    write(dir.path(), "bad.txt", "vessel_name=Healy\ninvestigator[\nname=J. Doe\n");
    let stderr = ome_fails(dir.path(), &["merge", "a.txt", "bad.txt"]);
    assert!(stderr.contains("bad.txt"), "{stderr}");
    assert!(stderr.contains("header line 3"), "{stderr}");
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_accepts_complete_submission() {
    let dir = setup_submissions();
    let out = json(&ome_ok(dir.path(), &["check", "a.txt"]));
    assert_eq!(out["acceptable"], true);
    assert_eq!(out["cruise_id"], "33HQ20110517");
}

#[test]
fn check_fails_on_missing_requirements() {
    let dir = setup_submissions();
    write(dir.path(), "thin.txt", "expocode=33HQ20110517\n");
    let out = ome_in(dir.path(), &["check", "thin.txt", "--format", "text"]);
    assert!(!out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("not acceptable"), "{stdout}");
    assert!(stdout.contains("at least one investigator is required"), "{stdout}");
}

#[test]
fn config_relaxes_acceptance() {
    let dir = setup_submissions();
    write(dir.path(), "thin.txt", "expocode=33HQ20110517\n");
    write(
        dir.path(),
        "ome.toml",
        "[acceptance]\nrequired_fields = [\"cruise_id\"]\nrequire_investigator = false\n",
    );
    let out = json(&ome_ok(dir.path(), &["check", "thin.txt"]));
    assert_eq!(out["acceptable"], true);
}

#[test]
fn config_sets_default_format() {
    let dir = setup_submissions();
    write(dir.path(), "custom.toml", "[output]\nformat = \"text\"\n");
    let out = ome_ok(dir.path(), &["--config", "custom.toml", "check", "a.txt"]);
    assert!(out.starts_with("33HQ20110517: acceptable"), "{out}");
}

#[test]
fn invalid_config_names_the_file() {
    let dir = setup_submissions();
    write(dir.path(), "ome.toml", "[merge]\nstrict = \"yes\"\n");
    let stderr = ome_fails(dir.path(), &["check", "a.txt"]);
    assert!(stderr.contains("ome.toml"), "{stderr}");
}

// ---------------------------------------------------------------------------
// header
// ---------------------------------------------------------------------------

#[test]
fn header_renders_a_clean_merge() {
    let dir = setup_submissions();
    write(
        dir.path(),
        "c.txt",
        &SUBMISSION_B.replace("Research Vessel", "Ship"),
    );
    let out = ome_ok(dir.path(), &["header", "a.txt", "c.txt"]);
    assert!(out.starts_with("cruise_id=33HQ20110517\n"), "{out}");
    assert!(out.contains("platform_type=Ship\n"));
    assert!(out.contains("investigator[\nname=J. Doe\nphone=555-1111\nemail=j@x.org\n]\n"));
}

#[test]
fn header_refuses_conflicts() {
    let dir = setup_submissions();
    let stderr = ome_fails(dir.path(), &["header", "a.txt", "b.txt"]);
    assert!(stderr.contains("platform_type"), "{stderr}");
}
