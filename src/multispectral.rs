use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Letters the filter wheel can dial, one per mounted filter.
pub const FILTER_ALPHABET: [char; 9] = ['R', 'G', 'B', 'C', 'F', 'N', 'M', 'P', 'Y'];

/// The two stage durations must each be a digit in [6,9] and sum to this.
pub const REQUIRED_DURATION_SUM: u8 = 15;
pub const STAGE_DIGIT_MIN: u8 = 6;
pub const STAGE_DIGIT_MAX: u8 = 9;

/// Fixed per-stage bound on how long the wheel may take to reach a filter.
pub const MAX_FILTER_TRANSITION_MS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CommandRejection {
    #[error("command must be exactly 4 characters, got {len}")]
    BadLength { len: usize },
    #[error("position {position}: expected a duration digit in [6,9], got '{found}'")]
    BadDigit { position: usize, found: char },
    #[error("stage durations must sum to 15, got {sum}")]
    DurationSum { sum: u8 },
    #[error("position {position}: '{found}' is not in the filter alphabet")]
    BadFilterLetter { position: usize, found: char },
    #[error("separation has not been confirmed")]
    NotSeparated,
    #[error("a filter sequence is already in flight")]
    AlreadyInFlight,
}

/// A validated operator command `D1 F1 D2 F2`, e.g. `9R6G`: hold filter R
/// for 9 s, then filter G for 6 s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCommand {
    pub duration1_s: u8,
    pub filter1: char,
    pub duration2_s: u8,
    pub filter2: char,
}

impl FilterCommand {
    pub fn parse(raw: &str) -> Result<FilterCommand, CommandRejection> {
        let chars: Vec<char> = raw.trim().chars().collect();
        if chars.len() != 4 {
            return Err(CommandRejection::BadLength { len: chars.len() });
        }

        let duration1_s = stage_digit(chars[0], 0)?;
        let duration2_s = stage_digit(chars[2], 2)?;
        let sum = duration1_s + duration2_s;
        if sum != REQUIRED_DURATION_SUM {
            return Err(CommandRejection::DurationSum { sum });
        }

        let filter1 = filter_letter(chars[1], 1)?;
        let filter2 = filter_letter(chars[3], 3)?;

        Ok(FilterCommand {
            duration1_s,
            filter1,
            duration2_s,
            filter2,
        })
    }

    /// Always 15 by construction; kept as a method so the countdown reads
    /// from the command, not from a second copy of the constant.
    pub fn total_duration_s(&self) -> u8 {
        self.duration1_s + self.duration2_s
    }

    /// Derives the two-stage motor command sent down to the vehicle.
    pub fn motor_command(&self) -> MotorCommand {
        MotorCommand { command: *self }
    }
}

impl fmt::Display for FilterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            self.duration1_s, self.filter1, self.duration2_s, self.filter2
        )
    }
}

fn stage_digit(c: char, position: usize) -> Result<u8, CommandRejection> {
    match c.to_digit(10) {
        Some(d) if (u32::from(STAGE_DIGIT_MIN)..=u32::from(STAGE_DIGIT_MAX)).contains(&d) => {
            Ok(d as u8)
        }
        _ => Err(CommandRejection::BadDigit { position, found: c }),
    }
}

fn filter_letter(c: char, position: usize) -> Result<char, CommandRejection> {
    if FILTER_ALPHABET.contains(&c) {
        Ok(c)
    } else {
        Err(CommandRejection::BadFilterLetter { position, found: c })
    }
}

/// Wire form `!M1:<dur>:<filter>:<max_ms>;M2:<dur>:<filter>:<max_ms>!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorCommand {
    pub command: FilterCommand,
}

impl MotorCommand {
    pub fn encode(&self) -> String {
        let c = &self.command;
        format!(
            "!M1:{}:{}:{};M2:{}:{}:{}!",
            c.duration1_s,
            c.filter1,
            MAX_FILTER_TRANSITION_MS,
            c.duration2_s,
            c.filter2,
            MAX_FILTER_TRANSITION_MS
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencerState {
    /// Separation has not been observed yet; no command can start.
    AwaitingSeparation,
    /// Separation latched, nothing in flight.
    Ready,
    /// Exactly one command executing; completion comes from the vehicle.
    Executing,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SequencerStats {
    pub submitted: u32,
    pub accepted: u32,
    pub rejected: u32,
    pub completed: u32,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    command: FilterCommand,
    started_at_ms: u64,
}

/// Time-bounded multi-spectral filter command sequencer.
///
/// The separation flag is a one-way latch for the session: set once by an
/// external status observation, never reset. The local countdown is a pure
/// time-remaining projection; actual completion is signaled by the
/// `MULTISPEKTRAL_COMPLETE` reply, which wins over the local timer.
#[derive(Debug)]
pub struct MultiSpectralSequencer {
    separation_occurred: bool,
    in_flight: Option<InFlight>,
    stats: SequencerStats,
}

impl MultiSpectralSequencer {
    pub fn new() -> Self {
        Self {
            separation_occurred: false,
            in_flight: None,
            stats: SequencerStats::default(),
        }
    }

    pub fn state(&self) -> SequencerState {
        if self.in_flight.is_some() {
            SequencerState::Executing
        } else if self.separation_occurred {
            SequencerState::Ready
        } else {
            SequencerState::AwaitingSeparation
        }
    }

    pub fn separation_occurred(&self) -> bool {
        self.separation_occurred
    }

    /// One-way latch, set by the status-code observation or the
    /// `AYIRMA_KOMUTU` reply.
    pub fn mark_separation(&mut self) {
        self.separation_occurred = true;
    }

    /// Submits a raw 4-character command. On acceptance the derived motor
    /// command is returned for transmission and the sequencer is `Executing`
    /// until the vehicle acknowledges completion.
    pub fn submit(&mut self, raw: &str, now_ms: u64) -> Result<MotorCommand, CommandRejection> {
        self.stats.submitted += 1;

        // Re-entrancy guard first: while executing, everything is rejected
        // regardless of validity.
        if self.in_flight.is_some() {
            self.stats.rejected += 1;
            return Err(CommandRejection::AlreadyInFlight);
        }

        let command = match FilterCommand::parse(raw) {
            Ok(c) => c,
            Err(e) => {
                self.stats.rejected += 1;
                return Err(e);
            }
        };

        if !self.separation_occurred {
            self.stats.rejected += 1;
            return Err(CommandRejection::NotSeparated);
        }

        self.in_flight = Some(InFlight {
            command,
            started_at_ms: now_ms,
        });
        self.stats.accepted += 1;
        Ok(command.motor_command())
    }

    /// Seconds left on the local countdown projection, `None` when idle.
    pub fn remaining_s(&self, now_ms: u64) -> Option<u64> {
        self.in_flight.map(|f| {
            let total_ms = u64::from(f.command.total_duration_s()) * 1000;
            let elapsed = now_ms.saturating_sub(f.started_at_ms);
            total_ms.saturating_sub(elapsed) / 1000
        })
    }

    pub fn in_flight(&self) -> Option<FilterCommand> {
        self.in_flight.map(|f| f.command)
    }

    /// Handles the vehicle's completion acknowledgement. Returns the command
    /// that just finished, if one was in flight.
    pub fn on_sequence_complete(&mut self) -> Option<FilterCommand> {
        let finished = self.in_flight.take().map(|f| f.command);
        if finished.is_some() {
            self.stats.completed += 1;
        }
        finished
    }

    pub fn stats(&self) -> SequencerStats {
        self.stats
    }
}

impl Default for MultiSpectralSequencer {
    fn default() -> Self {
        Self::new()
    }
}
