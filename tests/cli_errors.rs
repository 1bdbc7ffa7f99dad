#![cfg(feature = "cli")]

use predicates::prelude::*;

fn stream_doc() -> serde_json::Value {
    serde_json::json!({
        "id": "test_stream",
        "phase": "liquid",
        "concentrations": {
            "S_cat": 40.0,
            "S_an": 20.0,
            "S_IN": 700.35,
            "S_IC": 6005.5,
            "S_ac": 1.0,
            "S_pro": 1.0,
            "S_bu": 1.0,
            "S_va": 1.0
        }
    })
}

#[test]
fn cli_fails_without_any_input() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("digester_ph");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Missing input data"));
}

#[test]
fn cli_works_without_assumptions_with_stream_json() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("digester_ph");
    cmd.arg("--json")
        .arg("--stream-json")
        .arg(stream_doc().to_string());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"ph\""))
        .stdout(predicate::str::contains("\"kind\": \"solved\""));
}

#[test]
fn cli_prints_text_report_from_stdin_document() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("digester_ph");
    let doc = serde_json::json!({ "stream": stream_doc() }).to_string();

    cmd.arg("--input").arg("-").write_stdin(doc);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pH: 5.56"))
        .stdout(predicate::str::contains("Alkalinity: 350.00 meq/L"));
}

#[test]
fn cli_reports_defaults_for_gas_stream() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("digester_ph");
    let mut stream = stream_doc();
    stream["phase"] = serde_json::json!("gas");

    cmd.arg("--json").arg("--stream-json").arg(stream.to_string());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"non_liquid\""))
        .stdout(predicate::str::contains("\"alkalinity_meq_l\": 0.0"));
}

#[test]
fn cli_rejects_unusable_pka() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("digester_ph");
    let assumptions = serde_json::json!({
        "pka": { "w": 400.0, "nh": 9.25, "co2": 6.35, "ac": 4.76, "pro": 4.88, "bu": 4.82, "va": 4.86 }
    });
    cmd.arg("--stream-json")
        .arg(stream_doc().to_string())
        .arg("--assumptions-json")
        .arg(assumptions.to_string());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid dissociation constant Kw"));
}

#[test]
fn cli_reports_invalid_json_for_stream_json() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("digester_ph");
    cmd.arg("--stream-json").arg("{not valid json}");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid JSON in --stream-json"));
}

#[test]
fn cli_reports_invalid_json_in_file() {
    use std::fs::File;
    use std::io::Write as _;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let file_path = dir.path().join("bad.json");
    let mut f = File::create(&file_path).unwrap();
    writeln!(f, "this is not json").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("digester_ph");
    cmd.arg("--input").arg(file_path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid JSON in input document"));
}

#[test]
fn cli_reports_invalid_assumptions_json() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("digester_ph");
    cmd.arg("--stream-json")
        .arg(stream_doc().to_string())
        .arg("--assumptions-json")
        .arg("[1, 2]");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid JSON in --assumptions-json"));
}

#[test]
fn cli_input_document_carries_assumptions() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("digester_ph");
    let doc = serde_json::json!({
        "stream": stream_doc(),
        "assumptions": { "bicarbonate_correction": null }
    })
    .to_string();

    cmd.arg("--input").arg("-").write_stdin(doc);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pH: 5.56"))
        .stdout(predicate::str::contains("Alkalinity: 90.00 meq/L"));
}

#[test]
fn cli_reports_unreadable_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("digester_ph");
    cmd.arg("--input").arg(&missing);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error reading"));
}
