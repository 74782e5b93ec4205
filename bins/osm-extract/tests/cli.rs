use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn input(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

fn osm_extract() -> Command {
    let mut cmd = Command::cargo_bin("osm-extract").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn measure_prints_summary_json() {
    let file = input("[[0, 0], [0, 1], [1, 1], [0, 0]]");
    let output = osm_extract()
        .args(["measure", "--json"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["vertex_count"], 3);
    assert_eq!(summary["bbox"], serde_json::json!([0.0, 0.0, 1.0, 1.0]));
    assert!(summary["area_km2"].as_str().unwrap().parse::<f64>().unwrap() > 0.0);
}

#[test]
fn measure_accepts_feature_from_stdin() {
    let feature = r#"{
        "type": "Feature",
        "properties": {},
        "geometry": {"type": "Polygon", "coordinates": [[[13.0, 52.0], [13.1, 52.0], [13.1, 52.1], [13.0, 52.0]]]}
    }"#;
    osm_extract()
        .args(["measure", "--json", "-"])
        .write_stdin(feature)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"vertex_count\": 3"));
}

#[test]
fn measure_rejects_two_vertices() {
    let file = input("[[0, 0], [0, 1]]");
    osm_extract()
        .arg("measure")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("2 vertices"));
}

#[test]
fn measure_rejects_out_of_range_coordinates() {
    let file = input("[[0, 0], [0, 91], [1, 1]]");
    osm_extract()
        .arg("measure")
        .arg(file.path())
        .assert()
        .failure();
}

#[test]
fn draw_closes_on_snap_tap() {
    let file = input("[[0, 0], [0, 1], [1, 1], [0.0001, 0.0001], [5, 5]]");
    let output = osm_extract()
        .args(["draw", "--json"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["closed"], true);
    assert_eq!(result["vertex_count"], 3);
    assert_eq!(result["summary"]["bbox"], serde_json::json!([0.0, 0.0, 1.0, 1.0]));
    assert_eq!(result["polygon"]["geometry"]["coordinates"][0][3], serde_json::json!([0.0, 0.0]));
    assert_eq!(result["view"]["zoom"], 14.0);
}

#[test]
fn draw_reports_open_polygon() {
    let file = input("[[0, 0], [0, 1], [1, 1]]");
    let output = osm_extract()
        .args(["draw", "--json"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["closed"], false);
    assert!(result["summary"].is_null());
    assert!(result["metrics"]["area_km2"].is_string());
}

#[test]
fn extract_fails_cleanly_without_worker() {
    let file = input("[[0, 0], [0, 1], [1, 1]]");
    osm_extract()
        .args(["extract", "--api-url", "http://127.0.0.1:9"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Connection error"));
}
