//! # Ground Station Protocol Core
//!
//! Protocol layer for a half-duplex radio-serial downlink from a model
//! satellite. One noisy byte stream interleaves CSV telemetry records,
//! base64-wrapped JPEG frames and raw binary JPEG frames; this crate turns
//! it into typed, validated events.
//!
//! ## Features
//!
//! - **Stream demultiplexing**: text-line and binary-frame interpreters
//!   over one shared, bounded buffer
//! - **Resynchronization**: recovery to the next known sentinel after
//!   corruption, with bounded memory growth
//! - **Packet validation**: XOR-checksummed 22-field telemetry parsing
//!   with control-reply short-circuit
//! - **Alarm annunciator**: edge-triggered events off the 6-bit fault
//!   bitmap
//! - **Filter sequencer**: single in-flight, time-bounded multi-spectral
//!   command tracking behind a one-way separation latch
//!
//! ## Quick Start
//!
//! ```rust
//! use groundlink::packet::build_frame;
//! use groundlink::GroundStation;
//!
//! let mut station = GroundStation::new();
//!
//! // Feed raw link chunks as they arrive; consume typed events.
//! let frame = build_frame("1,2,000000,3,4,5,6,7,8,9,10,11,12,13,14,15,16,17,18,19,20,21");
//! for event in station.ingest(frame.as_bytes()) {
//!     println!("{event:?}");
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`station`] - per-session orchestrator and public API
//! - [`demux`] - byte stream demultiplexer and sniffing heuristics
//! - [`packet`] - telemetry frame validation and control replies
//! - [`frame`] - binary and legacy-text video frame extraction
//! - [`alarm`] - 6-bit annunciator state machine
//! - [`multispectral`] - filter command sequencer
//! - [`link`] - link configuration and outbound command path
//! - [`comm_errors`] - consolidated I/O failure diagnostics

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod alarm;
pub mod buffer;
pub mod comm_errors;
pub mod demux;
pub mod event;
pub mod frame;
pub mod link;
pub mod multispectral;
pub mod packet;
pub mod station;

// Re-export main public types for convenience
pub use alarm::{AlarmBit, AlarmCode, AlarmEvent, AlarmStateMachine};
pub use demux::ByteStreamDemultiplexer;
pub use event::GroundEvent;
pub use frame::{BinaryFrameExtractor, FrameSource, VideoFrame};
pub use link::{LinkConfig, LinkError, LinkWriter, OutboundCommand};
pub use multispectral::{CommandRejection, FilterCommand, MotorCommand, MultiSpectralSequencer};
pub use packet::{ControlReply, RejectReason, TelemetryPacket, TelemetryPacketValidator};
pub use station::GroundStation;
