use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "cuvee-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_cuvee-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("random-walk"));
}

#[test]
fn cli_runs_scenarios_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_cuvee-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "perfect-sparkling,careless-preparation,random-walk",
            "--iterations",
            "2",
            "--seeds",
            "1,2",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cuvée Scenario Tester"));
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output_path).expect("read report"))
            .expect("json report");
    assert_eq!(report.as_array().map(Vec::len), Some(6));
}

#[test]
fn cli_rejects_unparsable_seeds() {
    let exe = env!("CARGO_BIN_EXE_cuvee-tester");
    let output = Command::new(exe)
        .args(["--scenarios", "perfect-still", "--seeds", "chardonnay"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unrecognized seed token"));
}

#[test]
fn cli_fails_when_tuning_breaks_a_scenario() {
    let exe = env!("CARGO_BIN_EXE_cuvee-tester");
    let config_path = temp_path("config");
    // A tank that spoils at 100 fails the perfect run.
    let mut config: serde_json::Value =
        serde_json::from_str(include_str!("fixtures/fast_config.json")).expect("fixture");
    config["fermentation"]["spoiled_at"] = serde_json::json!(100.0);
    std::fs::write(&config_path, config.to_string()).expect("write config");
    let output = Command::new(exe)
        .args(["--scenarios", "perfect-still", "--iterations", "1", "--config"])
        .arg(&config_path)
        .output()
        .expect("run cli");
    assert_eq!(output.status.code(), Some(1));
}
