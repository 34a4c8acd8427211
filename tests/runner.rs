use std::path::Path;

use assert_approx_eq::assert_approx_eq;
use tempfile::tempdir;

fn ixa_infection() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("ixa-infection").unwrap()
}

fn read_report(path: &Path) -> (csv::StringRecord, Vec<csv::StringRecord>) {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open CSV file");
    let headers = reader.headers().unwrap().clone();
    let rows = reader
        .records()
        .map(|record| record.expect("Failed to read record"))
        .collect();
    (headers, rows)
}

fn column<'r>(headers: &csv::StringRecord, row: &'r csv::StringRecord, name: &str) -> &'r str {
    let index = headers
        .iter()
        .position(|header| header == name)
        .unwrap_or_else(|| panic!("no column {name}"));
    &row[index]
}

#[test]
fn test_cli_writes_infection_report() {
    let temp_dir = tempdir().unwrap();
    ixa_infection()
        .args(["--config", "tests/data/two_person_run.json", "--output-dir"])
        .arg(temp_dir.path())
        .assert()
        .success();

    let (headers, rows) = read_report(&temp_dir.path().join("infections.csv"));
    let events: Vec<(&str, &str, &str)> = rows
        .iter()
        .map(|row| {
            (
                column(&headers, row, "day"),
                column(&headers, row, "host"),
                column(&headers, row, "event"),
            )
        })
        .collect();
    assert_eq!(
        events,
        vec![
            ("0", "0", "exposure"),
            ("0", "1", "exposure"),
            ("0", "1", "infectious"),
            ("2", "0", "infectious"),
            ("2", "1", "recovered"),
            ("3", "0", "symptomatic"),
            ("6", "0", "asymptomatic"),
            ("7", "0", "recovered"),
            ("12", "1", "unsusceptible"),
            ("17", "0", "unsusceptible"),
        ]
    );

    let adult = &rows[0];
    let age: f64 = column(&headers, adult, "age").parse().unwrap();
    assert_approx_eq!(age, 33.5);
    let home_latitude: f64 = column(&headers, adult, "home_latitude").parse().unwrap();
    assert_approx_eq!(home_latitude, 33.75);
    assert_eq!(column(&headers, adult, "recovery_date"), "7");

    let child = &rows[1];
    assert_eq!(column(&headers, child, "place_type"), "S");
    assert_eq!(column(&headers, child, "place_id"), "12");
    // The seed row is written before the exposure is moved into the past.
    assert_eq!(column(&headers, child, "exposure_date"), "0");
    assert_eq!(column(&headers, &rows[2], "exposure_date"), "-3");
    // Seeds have no infector.
    assert_eq!(column(&headers, child, "census_tract"), "-1");
}

#[test]
fn test_cli_refuses_to_overwrite_reports() {
    let temp_dir = tempdir().unwrap();
    let run = |overwrite: bool| {
        let mut command = ixa_infection();
        command
            .args(["--config", "tests/data/two_person_run.json", "--output-dir"])
            .arg(temp_dir.path());
        if overwrite {
            command.arg("--overwrite");
        }
        command.assert()
    };

    run(false).success();
    run(false).failure();
    run(true).success();
}

#[test]
fn test_cli_without_report() {
    let temp_dir = tempdir().unwrap();
    ixa_infection()
        .args(["--config", "tests/data/no_report_run.json", "--output-dir"])
        .arg(temp_dir.path())
        .assert()
        .success();
    assert!(!temp_dir.path().join("infections.csv").exists());
}

#[test]
fn test_cli_missing_config() {
    let output = ixa_infection()
        .args(["--config", "tests/data/does_not_exist.json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("IoError"));
}

#[test]
fn test_cli_log_level() {
    let output = ixa_infection()
        .args([
            "--config",
            "tests/data/no_report_run.json",
            "--log-level",
            "info",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Loading run configuration from: tests/data/no_report_run.json"));
    assert!(stderr.contains("10 days of measles: 1 infections"));
}
