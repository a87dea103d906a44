mod common;

use std::fs;

use assert_cmd::Command;
use common::TestWorkspace;
use gridlens::column::ColumnSet;
use gridlens::format::DataKind;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

const SAMPLE_CSV: &str = "\
id,city,amount,flag,ordered
1,Oslo,10.5,true,2023-01-05
2,Bergen,3.25,false,2023-02-28
3,Oslo,7.0,true,2023-06-15
4,Trondheim,12.75,false,2023-12-31
5,Oslo,1.5,true,2023-07-04
";

fn gridlens_cmd() -> Command {
    Command::cargo_bin("gridlens").expect("binary exists")
}

#[test]
fn probe_writes_column_formats() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("sample.csv", SAMPLE_CSV);
    let columns = workspace.path().join("sample.columns.yaml");

    gridlens_cmd()
        .args([
            "probe",
            "-i",
            csv.to_str().unwrap(),
            "-c",
            columns.to_str().unwrap(),
        ])
        .assert()
        .success();

    let set = ColumnSet::load(&columns).expect("parse column file");
    assert_eq!(set.columns.len(), 5);
    let kind = |name: &str| {
        set.column(name)
            .and_then(|c| c.value_format.as_ref())
            .map(|f| f.kind)
    };
    assert_eq!(kind("id"), Some(DataKind::Integer));
    assert_eq!(kind("amount"), Some(DataKind::Numeric));
    assert_eq!(kind("flag"), Some(DataKind::Boolean));
    assert_eq!(kind("ordered"), Some(DataKind::DateTime));
    assert_eq!(kind("city"), None);
}

#[test]
fn probe_summary_lists_every_column() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("sample.csv", SAMPLE_CSV);

    gridlens_cmd()
        .args(["probe", "-i", csv.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("ordered").and(contains("yyyy-MM-dd")));
}

#[test]
fn clusters_rank_distinct_values_by_frequency() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("sample.csv", SAMPLE_CSV);

    let assert = gridlens_cmd()
        .args(["clusters", "-i", csv.to_str().unwrap(), "-n", "city"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let oslo = stdout.find("Oslo").expect("Oslo listed");
    let bergen = stdout.find("Bergen").expect("Bergen listed");
    assert!(oslo < bergen, "most frequent value comes first:\n{stdout}");
}

#[test]
fn clusters_unknown_column_fails_with_named_error() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("sample.csv", SAMPLE_CSV);

    gridlens_cmd()
        .args(["clusters", "-i", csv.to_str().unwrap(), "-n", "ghost"])
        .assert()
        .failure()
        .stderr(contains("Unknown column 'ghost'"));
}

#[test]
fn filter_counts_and_renders_surviving_rows() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("sample.csv", SAMPLE_CSV);

    gridlens_cmd()
        .args([
            "filter",
            "-i",
            csv.to_str().unwrap(),
            "--term",
            "city: city = 'Oslo'",
        ])
        .assert()
        .success()
        .stdout(contains("3"));

    gridlens_cmd()
        .args([
            "filter",
            "-i",
            csv.to_str().unwrap(),
            "--any-of",
            "city: Oslo; Bergen",
            "--table",
        ])
        .assert()
        .success()
        .stdout(contains("Bergen").and(contains("Oslo")));
}

#[test]
fn filter_with_typed_columns_compares_numbers_numerically() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("sample.csv", SAMPLE_CSV);
    let columns = workspace.path().join("sample.columns.yaml");

    gridlens_cmd()
        .args([
            "probe",
            "-i",
            csv.to_str().unwrap(),
            "-c",
            columns.to_str().unwrap(),
        ])
        .assert()
        .success();

    gridlens_cmd()
        .args([
            "filter",
            "-i",
            csv.to_str().unwrap(),
            "-c",
            columns.to_str().unwrap(),
            "--term",
            "amount: amount >= 7",
        ])
        .assert()
        .success()
        .stdout(contains("3"));
}

#[test]
fn filter_persists_active_filters_in_view_settings() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("sample.csv", SAMPLE_CSV);
    let settings = workspace.path().join("view.yaml");

    gridlens_cmd()
        .args([
            "filter",
            "-i",
            csv.to_str().unwrap(),
            "-s",
            settings.to_str().unwrap(),
            "--term",
            "city: city = 'Oslo'",
        ])
        .assert()
        .success();

    let stored = fs::read_to_string(&settings).expect("settings written");
    assert!(stored.contains("city = 'Oslo'"), "settings:\n{stored}");

    // A second run with no terms loads the stored filter and reapplies it.
    gridlens_cmd()
        .args([
            "filter",
            "-i",
            csv.to_str().unwrap(),
            "-s",
            settings.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("3"));
}
