use std::io;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::debug;

use crate::multispectral::{FilterCommand, MotorCommand};

pub const DEFAULT_BAUD_RATE: u32 = 57_600;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);
/// Fire the data-ready path on every received byte.
pub const DEFAULT_BYTE_THRESHOLD: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub baud_rate: u32,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub byte_threshold: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            byte_threshold: DEFAULT_BYTE_THRESHOLD,
        }
    }
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("port access denied: {0}")]
    PortAccessDenied(String),
    #[error("port operation timed out after {0:?}")]
    PortTimeout(Duration),
    #[error("port I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Everything the ground station can send up to the vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutboundCommand {
    /// `!xT!` - manual separation trigger.
    ManualSeparation,
    /// Raw 4-character multi-spectral command passthrough.
    MultiSpectral(FilterCommand),
    /// Derived two-stage motor command.
    Motor(MotorCommand),
    /// `#CALIB_PRESSURE:<reference_hpa>:<ground_altitude_m>#`
    CalibratePressure {
        reference_hpa: f32,
        ground_altitude_m: i32,
    },
    /// `#CALIB_GPS:<latitude>:<longitude>#`
    CalibrateGps { latitude: f64, longitude: f64 },
    /// `#CALIB_GYRO:RESET#`
    CalibrateGyroReset,
}

impl OutboundCommand {
    pub fn encode(&self) -> String {
        match self {
            OutboundCommand::ManualSeparation => "!xT!".to_owned(),
            OutboundCommand::MultiSpectral(cmd) => cmd.to_string(),
            OutboundCommand::Motor(cmd) => cmd.encode(),
            OutboundCommand::CalibratePressure {
                reference_hpa,
                ground_altitude_m,
            } => format!("#CALIB_PRESSURE:{reference_hpa}:{ground_altitude_m}#"),
            OutboundCommand::CalibrateGps {
                latitude,
                longitude,
            } => format!("#CALIB_GPS:{latitude}:{longitude}#"),
            OutboundCommand::CalibrateGyroReset => "#CALIB_GYRO:RESET#".to_owned(),
        }
    }
}

/// Timeout-bounded write half of the link.
///
/// Writes are never issued from inside the ingestion callback; the caller
/// enqueues and awaits them separately so the shared buffer is never
/// re-entered. A timeout is a reported error, not a silent retry; the
/// caller decides whether to resend.
#[derive(Debug)]
pub struct LinkWriter<W> {
    writer: W,
    config: LinkConfig,
}

impl<W: AsyncWrite + Unpin> LinkWriter<W> {
    pub fn new(writer: W, config: LinkConfig) -> Self {
        Self { writer, config }
    }

    pub async fn send(&mut self, command: &OutboundCommand) -> Result<(), LinkError> {
        let wire = command.encode();
        debug!(%wire, "sending command");
        let write_timeout = self.config.write_timeout;
        let write = async {
            self.writer.write_all(wire.as_bytes()).await?;
            self.writer.flush().await
        };
        match timeout(write_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(LinkError::PortAccessDenied(e.to_string()))
            }
            Ok(Err(e)) => Err(LinkError::Io(e)),
            Err(_) => Err(LinkError::PortTimeout(write_timeout)),
        }
    }

    /// Closes the write half. Safe to call at any time; a shutdown that
    /// exceeds the write timeout is reported, not retried.
    pub async fn close(mut self) -> Result<(), LinkError> {
        match timeout(self.config.write_timeout, self.writer.shutdown()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(LinkError::Io(e)),
            Err(_) => Err(LinkError::PortTimeout(self.config.write_timeout)),
        }
    }
}
