use groundlink::frame::{FRAME_END_MARKER, FRAME_START_MARKER};
use groundlink::multispectral::{CommandRejection, SequencerState};
use groundlink::packet::build_frame;
use groundlink::{GroundEvent, GroundStation};

const JPEG: &[u8] = &[0xFF, 0xD8, 0x10, 0x20, 0x30, 0xFF, 0xD9];

fn telemetry_line(packet_number: u32, status: u8, alarm: &str) -> String {
    build_frame(&format!(
        "{packet_number},{status},{alarm},12:30:45,1013.2,1008.5,120.5,118.2,\
         2.3,12.5,24.1,7.4,41.015,28.979,95.0,1.2,-0.8,175.3,9R6G,23.5,23.9,5541"
    ))
}

fn wire_frame(payload: &[u8]) -> Vec<u8> {
    let mut bytes = FRAME_START_MARKER.to_vec();
    bytes.extend_from_slice(payload);
    bytes.extend_from_slice(&FRAME_END_MARKER);
    bytes
}

#[test]
fn test_interleaved_stream_produces_ordered_events() {
    let mut station = GroundStation::new();

    let mut input = telemetry_line(1, 1, "000000").into_bytes();
    input.extend_from_slice(&wire_frame(JPEG));
    input.extend_from_slice(telemetry_line(2, 1, "100000").as_bytes());

    let events = station.ingest(&input);

    // Video first (binary path), then telemetry with alarm edges in-line.
    assert!(matches!(events[0], GroundEvent::Video(_)));
    assert!(matches!(&events[1], GroundEvent::Telemetry(p) if p.packet_number() == Some(1)));
    assert!(matches!(&events[2], GroundEvent::Telemetry(p) if p.packet_number() == Some(2)));
    assert!(matches!(events[3], GroundEvent::Alarm(_)));
    assert_eq!(events.len(), 4);
}

#[test]
fn test_alarm_edges_flow_from_packets() {
    let mut station = GroundStation::new();

    let codes = ["000000", "100000", "100000", "000000"];
    let mut fault_edges = 0;
    let mut cleared_edges = 0;
    for (i, code) in codes.iter().enumerate() {
        for event in station.ingest(telemetry_line(i as u32, 1, code).as_bytes()) {
            match event {
                GroundEvent::Alarm(groundlink::AlarmEvent::NewFault { .. }) => fault_edges += 1,
                GroundEvent::Alarm(groundlink::AlarmEvent::Cleared { .. }) => cleared_edges += 1,
                _ => {}
            }
        }
    }

    assert_eq!(fault_edges, 1);
    assert_eq!(cleared_edges, 1);
}

#[test]
fn test_separation_latched_once_from_status_code() {
    let mut station = GroundStation::new();

    let events = station.ingest(telemetry_line(1, 4, "000000").as_bytes());
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, GroundEvent::SeparationLatched))
            .count(),
        1
    );

    // Second observation: the latch is one-way, no second event.
    let events = station.ingest(telemetry_line(2, 4, "000000").as_bytes());
    assert!(!events
        .iter()
        .any(|e| matches!(e, GroundEvent::SeparationLatched)));
    assert!(station.sequencer().separation_occurred());
}

#[test]
fn test_full_command_cycle_through_replies() {
    let mut station = GroundStation::new();

    // Rejected before separation.
    assert_eq!(
        station.submit_command("9R6G", 0),
        Err(CommandRejection::NotSeparated)
    );

    // The vehicle reports separation via the control reply.
    let events = station.ingest(build_frame("AYIRMA_KOMUTU").as_bytes());
    assert!(events
        .iter()
        .any(|e| matches!(e, GroundEvent::SeparationLatched)));

    let motor = station.submit_command("9R6G", 1_000).expect("accepted");
    assert_eq!(motor.encode(), "!M1:9:R:1000;M2:6:G:1000!");
    assert_eq!(station.sequencer().state(), SequencerState::Executing);

    // Completion is signaled by the vehicle, not the local timer.
    let events = station.ingest(build_frame("MULTISPEKTRAL_COMPLETE").as_bytes());
    assert!(events
        .iter()
        .any(|e| matches!(e, GroundEvent::SequenceComplete { .. })));
    assert_eq!(station.sequencer().state(), SequencerState::Ready);
}

#[test]
fn test_comm_error_diagnostic_every_tenth() {
    let mut station = GroundStation::new();

    let mut bundles = 0;
    for i in 1..=20u64 {
        if let Some(GroundEvent::Diagnostic(bundle)) = station.record_comm_error(i * 50) {
            bundles += 1;
            assert_eq!(bundle.error_count % 10, 0);
        }
    }
    assert_eq!(bundles, 2);
    assert_eq!(station.comm_error_count(), 20);
}

#[test]
fn test_close_processes_buffered_then_stops() {
    let mut station = GroundStation::new();

    // A complete line is buffered but a trailing partial one is not.
    let mut input = telemetry_line(1, 1, "000000").into_bytes();
    input.extend_from_slice(b"$partial");
    let events = station.ingest(&input);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, GroundEvent::Telemetry(_)))
            .count(),
        1
    );

    station.close();
    assert!(station.is_closed());

    // Ingestion after close is a no-op.
    let events = station.ingest(telemetry_line(2, 1, "000000").as_bytes());
    assert!(events.is_empty());

    // Closing twice is safe.
    assert!(station.close().is_empty());
}

#[test]
fn test_demux_stats_accumulate_across_session() {
    let mut station = GroundStation::new();

    station.ingest(telemetry_line(1, 1, "000000").as_bytes());
    station.ingest(&wire_frame(JPEG));
    station.ingest(b"$broken*ZZ\n");

    let stats = station.demux_stats();
    assert_eq!(stats.packets_forwarded, 1);
    assert_eq!(stats.frames_extracted, 1);
    assert_eq!(stats.lines_rejected, 1);
}
