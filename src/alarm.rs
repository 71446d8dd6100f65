use core::fmt;

use heapless::Vec;
use serde::{Deserialize, Serialize};

pub const ALARM_BIT_COUNT: usize = 6;

/// One bit of the 6-bit alarm bitmap carried in every telemetry packet,
/// with its fixed annunciator label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(usize)]
pub enum AlarmBit {
    DescentRateOutOfRange = 0,
    CarrierDescentRateOutOfRange = 1,
    CarrierPressureMissing = 2,
    GpsDataMissing = 3,
    SeparationFailed = 4,
    FilterMechanismFault = 5,
}

impl AlarmBit {
    pub const ALL: [AlarmBit; ALARM_BIT_COUNT] = [
        AlarmBit::DescentRateOutOfRange,
        AlarmBit::CarrierDescentRateOutOfRange,
        AlarmBit::CarrierPressureMissing,
        AlarmBit::GpsDataMissing,
        AlarmBit::SeparationFailed,
        AlarmBit::FilterMechanismFault,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Audio cue slot for this fault, one distinct cue per bit.
    pub const fn audio_cue(self) -> usize {
        self as usize
    }

    pub const fn label(self) -> &'static str {
        match self {
            AlarmBit::DescentRateOutOfRange => "payload descent rate out of range",
            AlarmBit::CarrierDescentRateOutOfRange => "carrier descent rate out of range",
            AlarmBit::CarrierPressureMissing => "carrier pressure data missing",
            AlarmBit::GpsDataMissing => "payload position data missing",
            AlarmBit::SeparationFailed => "separation not performed",
            AlarmBit::FilterMechanismFault => "multi-spectral filter mechanism fault",
        }
    }
}

/// The 6-bit alarm bitmap. Wire form is exactly six `'0'`/`'1'` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlarmCode {
    bits: [bool; ALARM_BIT_COUNT],
}

impl AlarmCode {
    pub const CLEAR: AlarmCode = AlarmCode {
        bits: [false; ALARM_BIT_COUNT],
    };

    /// Parses the wire form. Anything other than six `'0'`/`'1'` characters
    /// is rejected.
    pub fn parse(raw: &str) -> Option<AlarmCode> {
        let raw = raw.trim();
        if raw.len() != ALARM_BIT_COUNT {
            return None;
        }
        let mut bits = [false; ALARM_BIT_COUNT];
        for (i, c) in raw.chars().enumerate() {
            match c {
                '0' => bits[i] = false,
                '1' => bits[i] = true,
                _ => return None,
            }
        }
        Some(AlarmCode { bits })
    }

    pub const fn is_set(&self, bit: AlarmBit) -> bool {
        self.bits[bit.index()]
    }

    pub fn is_clear(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }
}

impl fmt::Display for AlarmCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.bits {
            f.write_str(if b { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Edge-triggered annunciator event. `audio_cued` is false when the edge
/// was observed on the very first packet after reset: a fault that is
/// already latched when the link comes up lights the indicator but does
/// not beep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmEvent {
    NewFault { bit: AlarmBit, audio_cued: bool },
    Cleared { bit: AlarmBit },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorColor {
    /// Bit is `1`: fault active.
    Red,
    /// Bit is `0`: clear.
    Green,
}

/// Display projection of the current code: two tiers of indicator keyed by
/// bit index, both reflecting current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorPanel {
    pub master: [IndicatorColor; ALARM_BIT_COUNT],
    pub detail: [IndicatorColor; ALARM_BIT_COUNT],
}

/// Tracks the alarm bitmap across packets and emits one event per bit
/// transition, never per held level.
#[derive(Debug)]
pub struct AlarmStateMachine {
    current: AlarmCode,
    previous: AlarmCode,
    first_packet_seen: bool,
}

impl AlarmStateMachine {
    pub fn new() -> Self {
        Self {
            // All-zero is the reset state as well as a reachable one.
            current: AlarmCode::CLEAR,
            previous: AlarmCode::CLEAR,
            first_packet_seen: false,
        }
    }

    /// Applies the code from a new validated packet. Returns the 0→1 and
    /// 1→0 edges since the previous packet, at most one event per bit.
    pub fn apply(&mut self, code: AlarmCode) -> Vec<AlarmEvent, ALARM_BIT_COUNT> {
        let mut events: Vec<AlarmEvent, ALARM_BIT_COUNT> = Vec::new();
        let first = !self.first_packet_seen;

        for bit in AlarmBit::ALL {
            let was = self.current.is_set(bit);
            let now = code.is_set(bit);
            if !was && now {
                let _ = events.push(AlarmEvent::NewFault {
                    bit,
                    audio_cued: !first,
                });
            } else if was && !now {
                let _ = events.push(AlarmEvent::Cleared { bit });
            }
        }

        self.previous = self.current;
        self.current = code;
        self.first_packet_seen = true;
        events
    }

    pub fn current(&self) -> AlarmCode {
        self.current
    }

    pub fn previous(&self) -> AlarmCode {
        self.previous
    }

    pub fn indicators(&self) -> IndicatorPanel {
        let mut colors = [IndicatorColor::Green; ALARM_BIT_COUNT];
        for bit in AlarmBit::ALL {
            if self.current.is_set(bit) {
                colors[bit.index()] = IndicatorColor::Red;
            }
        }
        IndicatorPanel {
            master: colors,
            detail: colors,
        }
    }
}

impl Default for AlarmStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
