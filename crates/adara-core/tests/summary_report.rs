use std::fs;

use adara_core::protocol::{PacketType, frame_packet};
use adara_core::summary::{SummaryOptions, summarize_file};
use adara_core::{ParserConfig, REPORT_VERSION, StreamReport};
use serde_json::json;

const PULSE_A: u64 = 1_000_000_000 << 32;
const PULSE_B: u64 = PULSE_A | 16_666_667;

fn words(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

fn capture() -> Vec<u8> {
    let mut stream = frame_packet(
        PacketType::RunStatus.code(),
        PULSE_A,
        &words(&[1234, 1_000_000_000, (2 << 24) | 1]),
    );
    stream.extend(frame_packet(PacketType::Heartbeat.code(), 0, &[]));
    stream.extend(frame_packet(
        PacketType::RawEvent.code(),
        PULSE_B,
        &words(&[1, 0, 0, 0, 0, 0, 100, 7, 200, 8]),
    ));
    stream.extend(frame_packet(PacketType::Rtdl.code(), PULSE_B, &[0u8; 8]));
    stream.extend(frame_packet(
        PacketType::BeamMonitor.code(),
        PULSE_B,
        &words(&[0, 0, 0, 0, (1 << 22) | 3, 1, 0, 0x8000_0064, 0x0000_00c8, 0x8000_012c]),
    ));
    stream.extend(frame_packet(
        PacketType::RunStatus.code(),
        PULSE_B,
        &words(&[1234, 1_000_000_000, (5 << 24) | 1]),
    ));
    stream
}

fn summarize(bytes: &[u8], options: &SummaryOptions) -> StreamReport {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("capture.adara");
    fs::write(&path, bytes).expect("write capture");
    summarize_file(&path, options).expect("summarize")
}

#[test]
fn summary_matches_expected_json() {
    let bytes = capture();
    let report = summarize(&bytes, &SummaryOptions::default());

    assert_eq!(report.report_version, REPORT_VERSION);
    assert_eq!(report.tool.name, "adara");
    assert_eq!(report.input.bytes, bytes.len() as u64);
    assert_eq!(report.generated_at, "2021-09-09T01:46:40.016666667Z");

    let expected = json!({
        "bytes_total": 208,
        "packets_total": 5,
        "packet_counts": {
            "beam_monitor": 1,
            "heartbeat": 1,
            "raw_event": 1,
            "run_status": 2
        },
        "raw_events": 2,
        "banked_events": 0,
        "monitor_events": 3,
        "oversize_packets": 0,
        "oversize_bytes": 0,
        "malformed": {
            "count": 1,
            "examples": [
                "malformed packet type 0x00000100 pulse 0x3b9aca0000fe502b at stream offset 100: payload length mismatch: expected 120 bytes, got 8"
            ]
        },
        "first_pulse_id": PULSE_A,
        "last_pulse_id": PULSE_B,
        "time_start": "2021-09-09T01:46:40Z",
        "time_end": "2021-09-09T01:46:40.016666667Z",
        "runs": [
            { "run_number": 1234, "file_number": 1, "status": "new_run", "pulse_id": PULSE_A },
            { "run_number": 1234, "file_number": 1, "status": "end_run", "pulse_id": PULSE_B }
        ],
        "trailing_bytes": 0
    });
    let actual = serde_json::to_value(&report.summary).expect("serialize summary");
    assert_eq!(actual, expected);
}

#[test]
fn summary_is_independent_of_buffer_and_read_sizes() {
    let bytes = capture();
    let baseline = summarize(&bytes, &SummaryOptions::default());
    for (initial, max, read_size) in [(16, 64, 1), (16, 32, 5), (64, 64, 64)] {
        let options = SummaryOptions {
            parser: ParserConfig {
                initial_capacity: initial,
                max_capacity: max,
            },
            read_size,
        };
        let report = summarize(&bytes, &options);
        if max >= 56 {
            assert_eq!(report.summary, baseline.summary);
        } else {
            // the 56-byte raw event and beam monitor packets no longer fit and are streamed
            assert_eq!(report.summary.oversize_packets, 2);
            assert_eq!(report.summary.raw_events, 0);
            assert_eq!(report.summary.monitor_events, 0);
            assert_eq!(report.summary.packets_total, baseline.summary.packets_total);
        }
    }
}

#[test]
fn report_round_trips_through_json() {
    let report = summarize(&capture(), &SummaryOptions::default());
    let json = serde_json::to_string_pretty(&report).expect("serialize");
    let parsed: StreamReport = serde_json::from_str(&json).expect("parse");
    assert_eq!(parsed.summary, report.summary);
    assert_eq!(parsed.input.path, report.input.path);
}

#[test]
fn invalid_config_is_rejected() {
    let options = SummaryOptions {
        parser: ParserConfig {
            initial_capacity: 8,
            max_capacity: 8,
        },
        read_size: 8,
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("capture.adara");
    fs::write(&path, capture()).expect("write capture");
    let err = summarize_file(&path, &options).unwrap_err();
    assert!(err.to_string().contains("below the 16-byte packet header"));
}
