mod common;

use std::fs;

use predicates::{prelude::PredicateBooleanExt, str::contains};
use serde_json::Value;

use common::{TestWorkspace, fixture_path, path_str, read_csv};

#[test]
fn report_prints_metrics_and_breakdowns() {
    let workspace = TestWorkspace::new();
    let input = fixture_path("ev_sales.csv");
    workspace
        .command()
        .args(["report", "-i", path_str(&input)])
        .assert()
        .success()
        .stdout(contains("Total Vehicles"))
        .stdout(contains("₹10,575,000"))
        .stdout(contains("Revenue by segment"))
        .stdout(contains("Profit by manufacturer"))
        .stdout(contains("Vehicles by usage type"))
        .stdout(contains("Average energy by segment").not());
}

#[test]
fn report_filters_by_segment_and_writes_exports() {
    let workspace = TestWorkspace::new();
    let input = fixture_path("ev_sales.csv");
    let export = workspace.path().join("suv.csv");
    let summary = workspace.path().join("summary.csv");

    workspace
        .command()
        .args([
            "report",
            "-i",
            path_str(&input),
            "--segment",
            "SUV",
            "--export",
            path_str(&export),
            "--summary",
            path_str(&summary),
        ])
        .assert()
        .success();

    let (headers, rows) = read_csv(&export);
    assert_eq!(headers.last().map(String::as_str), Some("ProfitINR"));
    let ids = rows.iter().map(|row| row[0].as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["V001", "V002", "V004"]);

    let (summary_headers, metrics) = read_csv(&summary);
    assert_eq!(summary_headers, vec!["Metric", "Value"]);
    assert_eq!(
        metrics,
        vec![
            vec!["Total Vehicles".to_string(), "3".to_string()],
            vec!["Total Revenue (₹)".to_string(), "₹5,850,000".to_string()],
            vec!["Total Profit (₹)".to_string(), "₹5,740,000".to_string()],
            vec!["Avg Battery (kWh)".to_string(), "43.2".to_string()],
            vec!["Avg Range (km)".to_string(), "460.7".to_string()],
        ]
    );
}

#[test]
fn report_filters_combine_segment_and_manufacturer() {
    let workspace = TestWorkspace::new();
    let input = fixture_path("ev_sales.csv");
    let output = workspace
        .command()
        .args([
            "report",
            "-i",
            path_str(&input),
            "--segment",
            "SUV",
            "--segment",
            "Hatchback",
            "--manufacturer",
            "Tata",
            "--json",
        ])
        .output()
        .expect("run report");
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["rows"], 2);
    assert_eq!(report["metrics"]["total_vehicles"], 2);
    assert_eq!(report["metrics"]["total_profit"], 3_675_000.0);
    let breakdowns = report["breakdowns"].as_array().expect("breakdowns");
    let by_segment = &breakdowns[0];
    assert_eq!(by_segment["title"], "Revenue by segment");
    assert_eq!(by_segment["rows"][0]["key"], "Hatchback");
    assert_eq!(by_segment["rows"][0]["value"], 2_125_000.0);
}

#[test]
fn report_with_unmatched_filter_is_empty_but_succeeds() {
    let workspace = TestWorkspace::new();
    let input = fixture_path("ev_sales.csv");
    let summary = workspace.path().join("summary.csv");
    workspace
        .command()
        .args([
            "report",
            "-i",
            path_str(&input),
            "--manufacturer",
            "Tesla",
            "--summary",
            path_str(&summary),
        ])
        .assert()
        .success()
        .stderr(contains("No rows match the selection"));

    let contents = fs::read_to_string(&summary).expect("summary");
    assert!(contents.contains("Total Vehicles,0"));
    assert!(contents.contains("Avg Battery (kWh),n/a"));
}

#[test]
fn report_requires_segment_column() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("no_segment.csv", "brand,revenue\nTata,100\n");
    workspace
        .command()
        .args(["report", "-i", path_str(&input)])
        .assert()
        .failure()
        .stderr(contains(
            "Required column 'Segment' is missing from the dataset",
        ));
}

#[test]
fn report_without_cost_skips_profit() {
    let workspace = TestWorkspace::new();
    let input = workspace.write(
        "no_cost.csv",
        "brand,segment,revenue\nTata,SUV,100\nMG,SUV,300\n",
    );
    workspace
        .command()
        .args(["report", "-i", path_str(&input)])
        .assert()
        .success()
        .stdout(contains("₹400"))
        .stdout(contains("Profit by manufacturer").not())
        .stderr(contains("Profit metrics unavailable"));
}
