use std::path::{Path, PathBuf};

use adara_core::protocol::{PacketType, frame_packet};
use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

const PULSE: u64 = 1_000_000_000 << 32;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("adara"))
}

fn words(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

/// Run start, one raw event packet, one short RTDL packet, run end.
fn write_capture(dir: &Path) -> PathBuf {
    let mut stream = frame_packet(
        PacketType::RunStatus.code(),
        PULSE,
        &words(&[77, 1_000_000_000, (2 << 24) | 1]),
    );
    stream.extend(frame_packet(
        PacketType::RawEvent.code(),
        PULSE + 1,
        &words(&[1, 0, 0, 0, 0, 0, 10, 1]),
    ));
    stream.extend(frame_packet(PacketType::Rtdl.code(), PULSE + 1, &[0u8; 4]));
    stream.extend(frame_packet(
        PacketType::RunStatus.code(),
        PULSE + 2,
        &words(&[77, 1_000_000_000, (5 << 24) | 1]),
    ));
    let path = dir.join("run-77.adara");
    std::fs::write(&path, stream).expect("write capture");
    path
}

fn stdout_json(assert: &assert_cmd::assert::Assert) -> Value {
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn help_supports_summarize_aliases() {
    for name in ["summarize", "summarise", "analyse"] {
        cmd()
            .arg("stream")
            .arg(name)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.adara");
    let report = temp.path().join("report.json");

    cmd()
        .arg("stream")
        .arg("summarize")
        .arg(missing)
        .arg("-o")
        .arg(report)
        .assert()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn directory_input_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    cmd()
        .arg("stream")
        .arg("summarize")
        .arg(temp.path())
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("input is not a file"));
}

#[test]
fn stdout_outputs_summary_json() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path());
    let assert = cmd()
        .arg("stream")
        .arg("summarize")
        .arg(input)
        .arg("--stdout")
        .assert()
        .success();
    let json = stdout_json(&assert);
    assert_eq!(json["report_version"], 1);
    assert_eq!(json["tool"]["name"], "adara");
    assert_eq!(json["summary"]["packets_total"], 3);
    assert_eq!(json["summary"]["raw_events"], 1);
    assert_eq!(json["summary"]["malformed"]["count"], 1);
    assert_eq!(json["summary"]["runs"][1]["status"], "end_run");
}

#[test]
fn report_file_is_written() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path());
    let report = temp.path().join("out").join("report.json");

    cmd()
        .arg("stream")
        .arg("summarise")
        .arg(&input)
        .arg("-o")
        .arg(&report)
        .arg("--pretty")
        .assert()
        .success()
        .stderr(contains("OK: report written"));

    let text = std::fs::read_to_string(&report).expect("read report");
    assert!(text.contains('\n'));
    let json: Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(json["summary"]["packet_counts"]["run_status"], 2);
}

#[test]
fn report_must_differ_from_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path());

    cmd()
        .arg("stream")
        .arg("summarize")
        .arg(&input)
        .arg("-o")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("report path must differ from input"));
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path());
    let report = temp.path().join("report.json");

    cmd()
        .arg("stream")
        .arg("summarize")
        .arg(input)
        .arg("--stdout")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn pretty_and_compact_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path());

    cmd()
        .arg("stream")
        .arg("summarize")
        .arg(input)
        .arg("--stdout")
        .arg("--pretty")
        .arg("--compact")
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path());
    let report = temp.path().join("report.json");

    cmd()
        .arg("stream")
        .arg("summarize")
        .arg(input)
        .arg("-o")
        .arg(report)
        .arg("--quiet")
        .arg("--log-level")
        .arg("error")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn list_malformed_outputs_examples() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path());
    let report = temp.path().join("report.json");

    cmd()
        .arg("stream")
        .arg("summarize")
        .arg(input)
        .arg("-o")
        .arg(report)
        .arg("--list-malformed")
        .assert()
        .success()
        .stderr(contains("Malformed packets: 1").and(contains("payload length mismatch")));
}

#[test]
fn strict_fails_when_malformed_present() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path());
    let report = temp.path().join("report.json");

    cmd()
        .arg("stream")
        .arg("summarize")
        .arg(input)
        .arg("-o")
        .arg(&report)
        .arg("--strict")
        .assert()
        .code(2)
        .stderr(contains("malformed packets detected (1)"));
    assert!(report.exists());
}

#[test]
fn small_packet_limit_streams_large_packets() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path());
    let assert = cmd()
        .arg("stream")
        .arg("summarize")
        .arg(input)
        .arg("--stdout")
        .arg("--initial-capacity")
        .arg("16")
        .arg("--max-packet-size")
        .arg("32")
        .arg("--read-size")
        .arg("3")
        .assert()
        .success();
    let json = stdout_json(&assert);
    assert_eq!(json["summary"]["oversize_packets"], 1);
    assert_eq!(json["summary"]["packets_total"], 3);
}

#[test]
fn config_file_is_applied_and_validated() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path());
    let config = temp.path().join("parser.json");

    std::fs::write(&config, r#"{"initial_capacity": 16, "max_capacity": 32}"#).expect("config");
    let assert = cmd()
        .arg("stream")
        .arg("summarize")
        .arg(&input)
        .arg("--stdout")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
    assert_eq!(stdout_json(&assert)["summary"]["oversize_packets"], 1);

    std::fs::write(&config, r#"{"initial_capacity": 4}"#).expect("config");
    cmd()
        .arg("stream")
        .arg("summarize")
        .arg(&input)
        .arg("--stdout")
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(contains("invalid config").and(contains("hint:")));
}

#[test]
fn capacity_flags_are_validated() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path());

    cmd()
        .arg("stream")
        .arg("summarize")
        .arg(input)
        .arg("--stdout")
        .arg("--initial-capacity")
        .arg("64")
        .arg("--max-packet-size")
        .arg("32")
        .assert()
        .code(2)
        .stderr(contains("error:").and(contains("--max-packet-size")));
}

#[test]
fn glob_resolves_single_match() {
    let temp = TempDir::new().expect("tempdir");
    write_capture(temp.path());
    let pattern = temp.path().join("run-*.adara");

    cmd()
        .arg("stream")
        .arg("summarize")
        .arg(pattern)
        .arg("--stdout")
        .assert()
        .success();
}
