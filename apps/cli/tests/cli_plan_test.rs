//! Integration tests for the `wayfare plan` command.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SUMMARY: &str = r#"{"destination": "paris", "from_date": "2025-06-01", "to_date": "2025-06-07", "budget": 2000}"#;

fn wayfare(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wayfare").unwrap();
    cmd.env("HOME", home.path()).env_remove("WAYFARE_API_URL").current_dir(home.path());
    cmd
}

fn mock_trip(server: &mut mockito::Server, travel_status: usize) -> Vec<mockito::Mock> {
    vec![
        server.mock("GET", "/plan/trip-1").with_status(200).with_body(SUMMARY).create(),
        server
            .mock("GET", "/plan/trip-1/recommendation/lodging")
            .with_status(200)
            .with_body("<reasoning>central and affordable</reasoning><response>Hotel Lutetia</response>")
            .create(),
        server
            .mock("GET", "/plan/trip-1/recommendation/food")
            .with_status(200)
            .with_body("Eat at Le Cafe")
            .create(),
        server
            .mock("GET", "/plan/trip-1/recommendation/travel")
            .with_status(travel_status)
            .with_body(if travel_status == 200 { "Take the metro" } else { "" })
            .create(),
    ]
}

#[test]
fn test_plan_renders_all_stages() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mocks = mock_trip(&mut server, 200);

    wayfare(&home)
        .args(["--api-url", &server.url(), "plan", "trip-1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Hotel Lutetia")
                .and(predicate::str::contains("Reasoning: central and affordable"))
                .and(predicate::str::contains("Eat at Le Cafe"))
                .and(predicate::str::contains("Take the metro"))
                .and(predicate::str::contains("All recommendations complete")),
        );
    for mock in mocks {
        mock.assert();
    }
}

#[test]
fn test_plan_failed_stage_is_reported_and_run_continues() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let _mocks = mock_trip(&mut server, 500);

    wayfare(&home)
        .args(["--api-url", &server.url(), "plan", "trip-1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Error: HTTP 500")
                .and(predicate::str::contains("Eat at Le Cafe"))
                .and(predicate::str::contains("All recommendations complete")),
        );
}

#[test]
fn test_plan_json_events() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let _mocks = mock_trip(&mut server, 200);

    let output = wayfare(&home).args(["--api-url", &server.url(), "plan", "trip-1", "--json"]).output().unwrap();
    assert!(output.status.success());

    let events: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.first().unwrap()["type"], "stage_started");
    assert_eq!(events.last().unwrap()["type"], "all_complete");
    assert!(events.iter().any(|e| e["type"] == "reasoning_complete" && e["stage"] == "lodging"));
    let lodging_final = events
        .iter()
        .rev()
        .find(|e| e["type"] == "stage_update" && e["stage"] == "lodging")
        .unwrap();
    assert_eq!(lodging_final["visible"], "Hotel Lutetia");
    assert_eq!(lodging_final["reasoning"], "central and affordable");
}

#[test]
fn test_plan_unknown_trip_fails_before_streaming() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let _mock = server.mock("GET", "/plan/missing").with_status(404).create();
    let stage = server.mock("GET", "/plan/missing/recommendation/lodging").expect(0).create();

    wayfare(&home)
        .args(["--api-url", &server.url(), "plan", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch plan missing"));
    stage.assert();
}

#[test]
fn test_plan_rejects_zero_timeout() {
    let home = TempDir::new().unwrap();
    wayfare(&home)
        .args(["--api-url", "http://127.0.0.1:1", "plan", "trip-1", "--stage-timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("stage_timeout_secs"));
}
