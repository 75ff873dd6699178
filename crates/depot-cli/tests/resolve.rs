use std::fs;

use serde_json::Value;

mod common;

use common::{parse_json, snapshot_metadata, Fixture, RELEASE_JAR, SNAPSHOT_DIR};

#[test]
fn release_resolves_from_the_first_local_holding_it() {
    let fixture = Fixture::new("depot-resolve-release");
    fixture.place("libs-release", RELEASE_JAR, "local", 600);
    fixture.place("central", RELEASE_JAR, "remote", 10);

    let assert = fixture
        .depot()
        .args(["--json", "resolve", RELEASE_JAR, "--head"])
        .assert()
        .success();
    let payload = parse_json(&assert);

    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["details"]["outcome"], "found");
    assert_eq!(payload["details"]["repository"], "libs-release");
    assert_eq!(payload["details"]["descriptor"]["repo_path"]["path"], RELEASE_JAR);
}

#[test]
fn release_falls_through_to_the_remote() {
    let fixture = Fixture::new("depot-resolve-remote");
    fixture.place("central", RELEASE_JAR, "remote", 10);

    let assert = fixture
        .depot()
        .args(["--json", "resolve", RELEASE_JAR])
        .assert()
        .success();
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["repository"], "central");
}

#[test]
fn peer_requests_never_reach_the_remote() {
    let fixture = Fixture::new("depot-resolve-peer");
    fixture.place("central", RELEASE_JAR, "remote", 10);

    let assert = fixture
        .depot()
        .args(["--json", "--peer", "resolve", RELEASE_JAR])
        .assert()
        .code(1);
    let payload = parse_json(&assert);
    assert_eq!(payload["status"], "not-found");
    assert_eq!(payload["details"]["outcome"], "not-found");

    let assert = fixture
        .depot()
        .env("DEPOT_PEER", "1")
        .args(["--json", "resolve", RELEASE_JAR])
        .assert()
        .code(1);
    assert_eq!(parse_json(&assert)["status"], "not-found");
}

#[test]
fn newest_snapshot_wins_across_local_repositories() {
    let fixture = Fixture::new("depot-resolve-snapshot");
    let path = format!("{SNAPSHOT_DIR}/foo-1.0-SNAPSHOT.jar");
    fixture.place("libs-snapshot", &path, "older", 3_600);
    fixture.place("libs-plain", &path, "newer", 60);

    let assert = fixture
        .depot()
        .args(["--json", "resolve", &path, "--head"])
        .assert()
        .success();
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["repository"], "libs-plain");
}

#[test]
fn unknown_target_repository_is_not_found() {
    let fixture = Fixture::new("depot-resolve-unknown");
    fixture.place("libs-release", RELEASE_JAR, "local", 60);

    let assert = fixture
        .depot()
        .args(["--json", "resolve", RELEASE_JAR, "--repo", "nowhere"])
        .assert()
        .code(1);
    let payload = parse_json(&assert);
    assert_eq!(payload["status"], "not-found");
    assert!(payload["details"]["reason"]
        .as_str()
        .is_some_and(|reason| reason.contains("nowhere")));
}

#[test]
fn metadata_documents_are_merged_across_repositories() {
    let fixture = Fixture::new("depot-resolve-metadata");
    let path = format!("{SNAPSHOT_DIR}/maven-metadata.xml");
    fixture.place(
        "libs-snapshot",
        &path,
        &snapshot_metadata(&["1.0-SNAPSHOT"], Some(("20240101.000000", 3))),
        600,
    );
    fixture.place(
        "libs-plain",
        &path,
        &snapshot_metadata(&["1.0-SNAPSHOT", "1.1-SNAPSHOT"], Some(("20240202.000000", 7))),
        60,
    );

    let assert = fixture
        .depot()
        .args(["--json", "resolve", &path])
        .assert()
        .success();
    let payload = parse_json(&assert);
    let details = &payload["details"];

    assert_eq!(details["repository"], "libs-snapshot");
    let merged = &details["merged_metadata"];
    assert_eq!(
        merged["versions"],
        Value::from(vec!["1.0-SNAPSHOT", "1.1-SNAPSHOT"])
    );
    assert_eq!(merged["snapshot"]["build_number"], 7);
    let document = details["document"].as_str().expect("rendered document");
    assert!(document.contains("<buildNumber>7</buildNumber>"));
    assert!(document.contains("<version>1.1-SNAPSHOT</version>"));
}

#[test]
fn output_copies_the_resolved_content() {
    let fixture = Fixture::new("depot-resolve-output");
    fixture.place("libs-release", RELEASE_JAR, "jar-bytes", 60);
    let target = fixture.temp.path().join("out").join("foo.jar");

    let assert = fixture
        .depot()
        .args(["--json", "resolve", RELEASE_JAR, "-o"])
        .arg(&target)
        .assert()
        .success();
    let payload = parse_json(&assert);

    assert_eq!(payload["status"], "ok");
    assert_eq!(fs::read_to_string(&target).expect("output"), "jar-bytes");
}

#[test]
fn not_modified_when_the_content_is_older() {
    let fixture = Fixture::new("depot-resolve-ims");
    fixture.place("libs-release", RELEASE_JAR, "jar", 3_600);

    let assert = fixture
        .depot()
        .args([
            "--json",
            "resolve",
            RELEASE_JAR,
            "--if-modified-since",
            "2999-01-01T00:00:00Z",
        ])
        .assert()
        .success();
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["not_modified"], true);

    let assert = fixture
        .depot()
        .args([
            "--json",
            "resolve",
            RELEASE_JAR,
            "--head",
            "--if-modified-since",
            "2000-01-01T00:00:00Z",
        ])
        .assert()
        .success();
    assert!(parse_json(&assert)["details"].get("not_modified").is_none());
}

#[test]
fn missing_configuration_is_a_user_error() {
    let fixture = Fixture::new("depot-resolve-noconfig");
    let missing = fixture.temp.path().join("absent.toml");

    let assert = fixture
        .depot()
        .env("DEPOT_CONFIG", &missing)
        .args(["--json", "resolve", RELEASE_JAR])
        .assert()
        .code(1);
    let payload = parse_json(&assert);
    assert_eq!(payload["status"], "user-error");
    assert!(payload["details"]["hint"].is_string());
}

#[test]
fn human_output_reports_the_serving_repository() {
    let fixture = Fixture::new("depot-resolve-human");
    fixture.place("libs-release", RELEASE_JAR, "jar", 60);

    let assert = fixture
        .depot()
        .args(["resolve", RELEASE_JAR, "--head"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("resolved from libs-release"), "{stdout}");
}
