//! Boundary conditions: empty inputs, header-only files, oversize inputs,
//! malformed tables and bad configuration.

mod common;

use assert_cmd::Command;
use data_profiler::{
    Column, ProfilingError, Table,
    config::ProfileConfig,
    data::Value,
    inference::SemanticType,
    io_utils::{self, InputOptions},
    profile,
};
use predicates::str::contains;

use common::{TestWorkspace, raw_table};

fn profiler() -> Command {
    Command::cargo_bin("data-profiler").expect("binary exists")
}

#[test]
fn empty_file_is_rejected() {
    let workspace = TestWorkspace::new();
    let empty = workspace.write("empty.csv", "");
    profiler()
        .args(["profile", "-i", empty.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("is empty"));
}

#[test]
fn whitespace_only_stdin_is_rejected() {
    profiler()
        .args(["profile", "-i", "-"])
        .write_stdin("  \n\n")
        .assert()
        .failure()
        .stderr(contains("is empty"));
}

#[test]
fn header_only_csv_profiles_zero_rows() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("header_only.csv", "id,name,amount\n");
    let assert = profiler()
        .args(["profile", "-i", csv.to_str().unwrap()])
        .assert()
        .success();
    let json: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("json");
    assert_eq!(json["profile"]["amount"]["dataType"], "text");
    assert_eq!(json["profile"]["amount"]["missingPercentage"], 0.0);
    assert_eq!(
        json["summary"],
        "This dataset is empty: it has 0 rows and 3 columns."
    );
}

#[test]
fn oversize_input_is_refused() {
    let workspace = TestWorkspace::new();
    let mut contents = String::from("value\n");
    let row = "x".repeat(1023) + "\n";
    for _ in 0..1100 {
        contents.push_str(&row);
    }
    let path = workspace.write("big.csv", &contents);
    let options = InputOptions {
        max_size_mb: 1,
        ..InputOptions::new(&path)
    };
    let err = io_utils::load_table(&options).unwrap_err();
    assert!(format!("{err:#}").contains("exceeds the 1 MB size limit"));

    profiler()
        .args(["profile", "-i", path.to_str().unwrap(), "--max-size-mb", "1"])
        .assert()
        .failure()
        .stderr(contains("size limit"));
}

#[test]
fn malformed_json_is_rejected() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("broken.json", "[{\"a\": 1},");
    profiler()
        .args(["profile", "-i", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Parsing JSON document"));
}

#[test]
fn duplicate_headers_are_malformed() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("dupes.csv", "a,a\n1,2\n");
    let err = io_utils::load_table(&InputOptions::new(&path)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ProfilingError>(),
        Some(ProfilingError::MalformedTable(_))
    ));
}

#[test]
fn ragged_columns_are_malformed() {
    let err = Table::new(vec![
        Column::from_raw("a", &["1", "2"]),
        Column::from_raw("b", &["1"]),
    ])
    .unwrap_err();
    assert!(matches!(err, ProfilingError::MalformedTable(_)));
}

#[test]
fn bad_config_file_fails_before_profiling() {
    let workspace = TestWorkspace::new();
    let config = workspace.write("profile.yaml", "top-values-count: 0\n");
    let csv = workspace.write("data.csv", "a\n1\n");
    profiler()
        .args([
            "profile",
            "-i",
            csv.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("Invalid profiling configuration"));
}

#[test]
fn out_of_range_missing_threshold_is_invalid() {
    let table = raw_table(&[("a", &["1", "2"])]);
    let config = ProfileConfig {
        high_missingness_threshold: -1.0,
        ..ProfileConfig::default()
    };
    assert!(matches!(
        profile(&table, &config),
        Err(ProfilingError::InvalidConfig(_))
    ));
}

#[test]
fn table_without_columns_is_empty() {
    let table = Table::new(Vec::new()).expect("table");
    let result = profile(&table, &ProfileConfig::default()).expect("profile");
    assert!(result.profile.is_empty());
    assert_eq!(
        result.summary,
        "This dataset is empty: it has 0 rows and 0 columns."
    );
}

#[test]
fn huge_numbers_stay_numeric() {
    let table = Table::new(vec![
        Column::from_raw("big", &["1e100", "2e100", "3e100"]),
        Column::new(
            "huge",
            vec![
                Value::Number(f64::MAX),
                Value::Number(-f64::MAX),
                Value::Number(f64::MAX),
            ],
        ),
    ])
    .expect("table");
    let result = profile(&table, &ProfileConfig::default()).expect("profile");

    let big = &result.profile["big"];
    assert_eq!(big.data_type, SemanticType::Numeric);
    let stats = big.numeric_stats().expect("numeric stats");
    assert!((stats.mean / 2e100 - 1.0).abs() < 1e-12);
    assert!(stats.skewness.abs() < 1e-9);
    assert!((stats.kurtosis + 1.5).abs() < 1e-9);
    assert!(result.visualizations.contains_key("big_histogram"));

    let huge = &result.profile["huge"];
    assert_eq!(huge.data_type, SemanticType::Numeric);
    assert!(huge.numeric_stats().is_some_and(|stats| stats.std.is_finite()));
}

#[test]
fn placeholder_tokens_count_as_missing() {
    let table = raw_table(&[("n", &["1", "NA", "null", "-", "2", "n/a"])]);
    let result = profile(&table, &ProfileConfig::default()).expect("profile");
    let column = &result.profile["n"];
    assert_eq!(column.data_type, SemanticType::Numeric);
    assert_eq!(column.missing_count, 4);
}

#[test]
fn long_labels_are_truncated() {
    let long = "y".repeat(150);
    let table = raw_table(&[("label", &[long.as_str(), long.as_str(), "short"])]);
    let result = profile(&table, &ProfileConfig::default()).expect("profile");
    let (label, count) = result.profile["label"]
        .top_values
        .get_index(0)
        .expect("top value");
    assert_eq!(label.chars().count(), 103);
    assert!(label.ends_with("..."));
    assert_eq!(*count, 2);
}
