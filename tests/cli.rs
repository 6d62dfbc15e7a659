//! End-to-end tests driving the nat64plot binary over the bundled fixtures.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// Command running in an empty directory so no local config is picked up.
fn nat64plot(cwd: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nat64plot").unwrap();
    cmd.current_dir(cwd.path())
        .env_remove("NAT64PLOT_OUTPUT_DIR")
        .arg("--no-progress");
    cmd
}

#[test]
fn test_rtt_summary_writes_tables_and_chart() {
    let cwd = TempDir::new().unwrap();
    let out = cwd.path().join("img");

    nat64plot(&cwd)
        .arg("rtt-summary")
        .arg("--scenario")
        .arg(format!("Single={}", fixture("ping").display()))
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Collected 2 measurements"))
        .stdout(predicate::str::contains("RTT MEASUREMENT SUMMARY TABLE"))
        .stdout(predicate::str::contains("KEY INSIGHTS:"))
        .stdout(predicate::str::contains(
            "IPv4 - Best: tundra-ns in Single (0.414ms avg)",
        ));

    let csv = fs::read_to_string(out.join("rtt_summary_table.csv")).unwrap();
    assert!(csv.starts_with("Scenario,IP Type,Tool,IP Address"));
    assert!(csv.contains("Single,IPv6,jool,2001:db8::1,0.198,0.213"));

    let tex = fs::read_to_string(out.join("rtt_summary_table.tex")).unwrap();
    assert!(tex.contains("\\texttt{192.0.0.171}"));

    let json = fs::read_to_string(out.join("rtt_summary_table.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(doc["record_count"], 2);

    let svg = fs::read_to_string(out.join("rtt_comparison_summary.svg")).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Single - IPv4 Transition"));
}

#[test]
fn test_throughput_summary_per_duration_chart() {
    let cwd = TempDir::new().unwrap();
    let out = cwd.path().join("img");

    nat64plot(&cwd)
        .arg("throughput-summary")
        .arg("--scenario")
        .arg(format!("LocalSingle_tsc={}", fixture("tcp").display()))
        .arg("--durations")
        .arg("30s")
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Collected 2 measurements"))
        .stdout(predicate::str::contains("30S DURATION:"))
        .stdout(predicate::str::contains(
            "IPv4 - Best: tundra-ns in LocalSingle_tsc (9.400 Gbps avg)",
        ));

    assert!(out.join("throughput_summary_table.csv").is_file());
    assert!(out.join("throughput_summary_table.tex").is_file());
    assert!(out.join("throughput_comparison_summary_30s.svg").is_file());
    assert!(!out.join("throughput_comparison_summary_2min.svg").exists());
}

#[test]
fn test_summary_without_data() {
    let cwd = TempDir::new().unwrap();
    let empty = TempDir::new().unwrap();
    let out = cwd.path().join("img");

    nat64plot(&cwd)
        .arg("throughput-summary")
        .arg("--scenario")
        .arg(format!("Lab={}", empty.path().display()))
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("No data collected!"));

    assert!(!out.exists());
}

#[test]
fn test_rtt_renders_both_scales() {
    let cwd = TempDir::new().unwrap();
    let out = cwd.path().join("img");

    nat64plot(&cwd)
        .arg("rtt")
        .arg("--folder")
        .arg(fixture("ping"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("Single_ping_rtt_tsc_30s_linear.svg").is_file());
    assert!(out.join("Single_ping_rtt_tsc_30s_log.svg").is_file());
}

#[test]
fn test_tcp_grid_layout() {
    let cwd = TempDir::new().unwrap();
    let out = cwd.path().join("img");

    nat64plot(&cwd)
        .arg("tcp")
        .arg("--folder")
        .arg(fixture("tcp"))
        .arg("--durations")
        .arg("30s")
        .arg("--layout")
        .arg("grid")
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    assert!(out
        .join("Single_tcp_throughput_over_time_tsc_linear.svg")
        .is_file());
    assert!(!out.join("Single_tcp_combined_tsc_linear.svg").exists());
}

#[test]
fn test_udp_writes_three_charts() {
    let cwd = TempDir::new().unwrap();
    let out = cwd.path().join("img");

    nat64plot(&cwd)
        .arg("udp")
        .arg("--folder")
        .arg(fixture("udp"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    for name in [
        "udp_throughput_over_time.svg",
        "udp_loss_pct_over_time.svg",
        "udp_jitter_over_time.svg",
    ] {
        assert!(out.join(name).is_file(), "missing {}", name);
    }

    let svg = fs::read_to_string(out.join("udp_throughput_over_time.svg")).unwrap();
    assert!(svg.contains("0.005% loss"));
}

#[test]
fn test_dry_run_lists_files() {
    let cwd = TempDir::new().unwrap();
    let out = cwd.path().join("img");

    nat64plot(&cwd)
        .arg("--dry-run")
        .arg("rtt")
        .arg("--folder")
        .arg(fixture("ping"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("tundra-ns_192.0.0.171_ipv4_30s.txt ("))
        .stdout(predicate::str::contains("-> tundra-ns | 192.0.0.171 | IPv4 | 30s"))
        .stdout(predicate::str::contains("2001:db8::1 | IPv6"))
        .stdout(predicate::str::contains("notes_30s.txt"))
        .stdout(predicate::str::contains("Dry run complete"));

    assert!(!out.exists());
}

#[test]
fn test_missing_folder_fails() {
    let cwd = TempDir::new().unwrap();

    nat64plot(&cwd)
        .arg("rtt")
        .arg("--folder")
        .arg(cwd.path().join("nope"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Directory not found"));
}

#[test]
fn test_missing_subcommand_is_usage_error() {
    let cwd = TempDir::new().unwrap();

    nat64plot(&cwd).assert().code(2);
}

#[test]
fn test_init_config() {
    let cwd = TempDir::new().unwrap();

    nat64plot(&cwd)
        .arg("--init-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created .nat64plot.toml"));

    let content = fs::read_to_string(cwd.path().join(".nat64plot.toml")).unwrap();
    assert!(content.contains("[plot]"));
    assert!(content.contains("tundra-ns"));
    assert!(content.contains("fd00_64_64_5f00_20d2__400"));

    // refuses to overwrite
    nat64plot(&cwd).arg("--init-config").assert().code(1);
}
