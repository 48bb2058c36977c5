use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use adara_core::protocol::layout;
use adara_core::protocol::{PacketType, frame_packet};

const RUN_NUMBER: u32 = 1234;
const FIRST_PULSE_SECONDS: u64 = 1_000_000_000;
const PULSE_PERIOD_NANOS: u64 = 16_666_667;
const PULSES: u64 = 4;

const STATUS_NEW_RUN: u32 = 2;
const STATUS_END_RUN: u32 = 5;
const MARKER_SCAN_START: u32 = 1;

fn main() -> Result<(), String> {
    let root = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("fixtures"));
    write_stream(&root.join("basic_run.adara"), &basic_run())?;
    write_stream(&root.join("malformed.adara"), &malformed())?;
    write_stream(&root.join("truncated.adara"), &truncated())?;
    Ok(())
}

fn write_stream(path: &Path, bytes: &[u8]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {}", parent.display(), err))?;
    }
    fs::write(path, bytes).map_err(|err| format!("failed to write {}: {}", path.display(), err))
}

/// A short run: status, info, geometry, a few pulses of events and the end.
fn basic_run() -> Vec<u8> {
    let mut stream = Vec::new();
    let start = pulse_id(0);
    stream.extend(run_status(start, STATUS_NEW_RUN));
    stream.extend(text_packet(
        PacketType::RunInfo,
        start,
        b"<runinfo><run_number>1234</run_number></runinfo>",
    ));
    stream.extend(text_packet(
        PacketType::Geometry,
        start,
        b"<instrument name=\"SNAP\"/>",
    ));
    stream.extend(beamline_info(start, "BL3", "SNAP", "Spallation Neutrons and Pressure"));
    stream.extend(annotation(start, MARKER_SCAN_START, 1, "scan 1"));

    for pulse in 0..PULSES {
        let id = pulse_id(pulse);
        stream.extend(raw_event(id, &[(1000 + pulse as u32, 7), (1500, 8)]));
        stream.extend(banked_event(id, &[(3, &[(2000, 30), (2100, 31)]), (4, &[])]));
        stream.extend(beam_monitor(id, 1, &[0x8000_0064, 0x0000_00c8]));
        stream.extend(frame_packet(PacketType::Heartbeat.code(), 0, &[]));
    }

    stream.extend(variable_double(pulse_id(PULSES), 2, 5, 295.15));
    stream.extend(run_status(pulse_id(PULSES), STATUS_END_RUN));
    stream
}

/// Valid packets around one RTDL packet that is too short.
fn malformed() -> Vec<u8> {
    let mut stream = run_status(pulse_id(0), STATUS_NEW_RUN);
    stream.extend(frame_packet(PacketType::Rtdl.code(), pulse_id(1), &[0u8; 8]));
    stream.extend(frame_packet(PacketType::Heartbeat.code(), 0, &[]));
    stream
}

/// A run whose last packet is cut short.
fn truncated() -> Vec<u8> {
    let mut stream = run_status(pulse_id(0), STATUS_NEW_RUN);
    let cut = raw_event(pulse_id(1), &[(10, 1), (20, 2)]);
    stream.extend_from_slice(&cut[..cut.len() - 5]);
    stream
}

fn pulse_id(pulse: u64) -> u64 {
    let nanos = pulse * PULSE_PERIOD_NANOS;
    let seconds = FIRST_PULSE_SECONDS + nanos / 1_000_000_000;
    (seconds << 32) | (nanos % 1_000_000_000)
}

fn words(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

fn run_status(pulse: u64, status: u32) -> Vec<u8> {
    let start = (pulse >> 32) as u32;
    let body = words(&[RUN_NUMBER, start, (status << layout::RUN_STATUS_SHIFT) | 1]);
    frame_packet(PacketType::RunStatus.code(), pulse, &body)
}

fn text_packet(kind: PacketType, pulse: u64, text: &[u8]) -> Vec<u8> {
    let mut body = words(&[text.len() as u32]);
    body.extend_from_slice(text);
    frame_packet(kind.code(), pulse, &body)
}

fn beamline_info(pulse: u64, id: &str, short: &str, long: &str) -> Vec<u8> {
    let sizes = ((id.len() as u32) << layout::BEAMLINE_ID_SHIFT)
        | ((short.len() as u32) << layout::BEAMLINE_SHORT_SHIFT)
        | long.len() as u32;
    let mut body = words(&[sizes]);
    for part in [id, short, long] {
        body.extend_from_slice(part.as_bytes());
    }
    frame_packet(PacketType::BeamlineInfo.code(), pulse, &body)
}

fn annotation(pulse: u64, marker: u32, scan: u32, comment: &str) -> Vec<u8> {
    let flags = (marker << layout::MARKER_TYPE_SHIFT) | comment.len() as u32;
    let mut body = words(&[flags, scan]);
    body.extend_from_slice(comment.as_bytes());
    frame_packet(PacketType::StreamAnnotation.code(), pulse, &body)
}

fn raw_event(pulse: u64, events: &[(u32, u32)]) -> Vec<u8> {
    let mut body = words(&[1, layout::END_OF_PULSE_BIT, 0x0100_0400, 0, 0, 0]);
    for (tof, pixel) in events {
        body.extend(words(&[*tof, *pixel]));
    }
    frame_packet(PacketType::RawEvent.code(), pulse, &body)
}

fn banked_event(pulse: u64, banks: &[(u32, &[(u32, u32)])]) -> Vec<u8> {
    let mut body = words(&[1024, 60, 0, 0]);
    body.extend(words(&[1, 0, 0, banks.len() as u32]));
    for (bank_id, events) in banks {
        body.extend(words(&[*bank_id, events.len() as u32]));
        for (tof, pixel) in *events {
            body.extend(words(&[*tof, *pixel]));
        }
    }
    frame_packet(PacketType::BankedEvent.code(), pulse, &body)
}

fn beam_monitor(pulse: u64, monitor: u32, events: &[u32]) -> Vec<u8> {
    let mut body = words(&[1024, 60, 0, 0]);
    body.extend(words(&[
        (monitor << layout::MONITOR_ID_SHIFT) | events.len() as u32,
        1,
        0,
    ]));
    body.extend(words(events));
    frame_packet(PacketType::BeamMonitor.code(), pulse, &body)
}

fn variable_double(pulse: u64, device: u32, variable: u32, value: f64) -> Vec<u8> {
    let mut body = words(&[device, variable, 0]);
    body.extend_from_slice(&value.to_le_bytes());
    frame_packet(PacketType::VariableDouble.code(), pulse, &body)
}
