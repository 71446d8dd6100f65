use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire framing: `$f1,f2,...,f22*XX\n`, XX = uppercase-hex XOR of the
/// payload between `$` and `*`.
pub const PACKET_SENTINEL: char = '$';
pub const CHECKSUM_SEPARATOR: char = '*';
pub const TELEMETRY_FIELD_COUNT: usize = 22;

/// Role of each of the 22 comma-separated telemetry fields, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(usize)]
pub enum TelemetryField {
    PacketNumber = 0,
    SatelliteStatus = 1,
    AlarmCode = 2,
    Timestamp = 3,
    Pressure1 = 4,
    Pressure2 = 5,
    Altitude1 = 6,
    Altitude2 = 7,
    AltitudeDelta = 8,
    DescentRate = 9,
    Temperature = 10,
    BatteryVoltage = 11,
    GpsLatitude = 12,
    GpsLongitude = 13,
    GpsAltitude = 14,
    Pitch = 15,
    Roll = 16,
    Yaw = 17,
    FilterStatus = 18,
    IotTemperature1 = 19,
    IotTemperature2 = 20,
    TeamNumber = 21,
}

impl TelemetryField {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Out-of-band acknowledgements carried in the same `$...*XX` framing as
/// telemetry. They bypass the 22-field parser entirely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlReply {
    GyroCalibOk,
    GyroCalibError,
    PressureCalibOk { reference_hpa: f32 },
    PressureCalibError,
    /// `MULTISPEKTRAL_COMPLETE`: the in-flight filter sequence finished.
    MultiSpectralComplete,
    /// `AYIRMA_KOMUTU`: the vehicle reports payload separation.
    SeparationOccurred,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("malformed framing: missing '$' start or '*XX' checksum trailer")]
    MalformedFraming,
    #[error("checksum mismatch: frame says {expected:02X}, computed {computed:02X}")]
    ChecksumMismatch { expected: u8, computed: u8 },
    #[error("field count mismatch: expected 22, got {count}")]
    FieldCountMismatch { count: usize },
}

/// A validated 22-field telemetry record. Immutable once created; consumers
/// receive copies, never a view into the link buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryPacket {
    fields: Vec<String>,
}

impl TelemetryPacket {
    pub fn field(&self, field: TelemetryField) -> &str {
        &self.fields[field.index()]
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Locale-invariant numeric read of a field: a `,` decimal separator is
    /// normalized to `.` before parsing.
    pub fn numeric(&self, field: TelemetryField) -> Option<f64> {
        parse_decimal(self.field(field))
    }

    pub fn packet_number(&self) -> Option<u32> {
        self.field(TelemetryField::PacketNumber).trim().parse().ok()
    }

    pub fn satellite_status(&self) -> Option<u8> {
        self.field(TelemetryField::SatelliteStatus).trim().parse().ok()
    }

    pub fn alarm_code(&self) -> &str {
        self.field(TelemetryField::AlarmCode)
    }
}

/// Either a telemetry packet or a control reply, as recovered from one
/// checksum-valid line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParsedLine {
    Packet(TelemetryPacket),
    Control(ControlReply),
}

/// XOR-fold of every payload byte, the frame checksum.
pub fn xor_checksum(payload: &str) -> u8 {
    payload.bytes().fold(0, |acc, b| acc ^ b)
}

/// Builds a complete wire frame from a payload. Used for outbound replies
/// and by tests asserting the round-trip property.
pub fn build_frame(payload: &str) -> String {
    format!("{PACKET_SENTINEL}{payload}{CHECKSUM_SEPARATOR}{:02X}\n", xor_checksum(payload))
}

/// `,`-as-decimal-separator is normalized to `.` before parsing.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse().ok()
}

#[derive(Debug, Default)]
pub struct TelemetryPacketValidator;

impl TelemetryPacketValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates one trimmed line. Checksum is verified before shape so a
    /// corrupted frame never reaches the field splitter.
    pub fn parse(&self, line: &str) -> Result<ParsedLine, RejectReason> {
        let line = line.trim();
        let body = line
            .strip_prefix(PACKET_SENTINEL)
            .ok_or(RejectReason::MalformedFraming)?;

        // Split at the LAST '*': the JPEG-adjacent payload may itself
        // contain earlier asterisks.
        let star = body
            .rfind(CHECKSUM_SEPARATOR)
            .ok_or(RejectReason::MalformedFraming)?;
        let payload = &body[..star];
        let checksum_text = &body[star + 1..];

        if checksum_text.len() != 2 {
            return Err(RejectReason::MalformedFraming);
        }
        let expected = u8::from_str_radix(checksum_text, 16)
            .map_err(|_| RejectReason::MalformedFraming)?;

        let computed = xor_checksum(payload);
        if computed != expected {
            return Err(RejectReason::ChecksumMismatch { expected, computed });
        }

        if let Some(reply) = parse_control_reply(payload) {
            return Ok(ParsedLine::Control(reply));
        }

        let fields: Vec<String> = payload.split(',').map(str::to_owned).collect();
        if fields.len() != TELEMETRY_FIELD_COUNT {
            return Err(RejectReason::FieldCountMismatch { count: fields.len() });
        }

        Ok(ParsedLine::Packet(TelemetryPacket { fields }))
    }
}

fn parse_control_reply(payload: &str) -> Option<ControlReply> {
    match payload {
        "GYRO_CALIB_OK" => Some(ControlReply::GyroCalibOk),
        "GYRO_CALIB_ERROR" => Some(ControlReply::GyroCalibError),
        "PRESSURE_CALIB_ERROR" => Some(ControlReply::PressureCalibError),
        "MULTISPEKTRAL_COMPLETE" => Some(ControlReply::MultiSpectralComplete),
        "AYIRMA_KOMUTU" => Some(ControlReply::SeparationOccurred),
        _ => payload
            .strip_prefix("PRESSURE_CALIB_OK:")
            .and_then(|v| parse_decimal(v))
            .map(|v| ControlReply::PressureCalibOk {
                reference_hpa: v as f32,
            }),
    }
}
