//! Decoding of nearable telemetry frames.
//!
//! A frame is the manufacturer-specific data of a BLE advertisement, company
//! ID included. All multi-byte fields are little-endian:
//!
//! - Bytes 0-1: Company ID
//! - Byte 2: Frame type
//! - Byte 3: Device type code
//! - Bytes 4-9: Identifier
//! - Byte 10: Hardware version (major in the high nibble, minor in the low)
//! - Bytes 11-13: Firmware version (major, minor, patch)
//! - Byte 14: Status (bit 0 firmware in App state, bit 1 moving, bits 2-4 orientation)
//! - Bytes 15-16: Current motion state duration
//! - Bytes 17-18: Previous motion state duration
//! - Bytes 19-21: X, Y, Z acceleration (signed, raw sensor units)
//! - Bytes 22-23: Idle battery reading
//! - Bytes 24-25: Stress battery reading
//! - Bytes 26-27: Temperature (signed fixed point)
//! - Byte 28: TX power (signed dBm)
//! - Byte 29: Channel
//!
//! Bytes past the end of the frame are ignored.

use log::debug;
use thiserror::Error;

use crate::config::DecoderConfig;
use crate::model::{FirmwareState, Identifier, Nearable, NearableType, Orientation};
use crate::zone::{RSSI_ERROR, derive_zone};

pub(crate) mod layout {
    use std::ops::Range;

    pub const COMPANY_ID: usize = 0;
    pub const FRAME_TYPE: usize = 2;
    pub const SIGNATURE_LEN: usize = 3;
    pub const DEVICE_TYPE: usize = 3;
    pub const IDENTIFIER: Range<usize> = 4..10;
    pub const HARDWARE_VERSION: usize = 10;
    pub const FIRMWARE_VERSION: usize = 11;
    pub const STATUS: usize = 14;
    pub const CURRENT_MOTION: usize = 15;
    pub const PREVIOUS_MOTION: usize = 17;
    pub const ACCELERATION: usize = 19;
    pub const IDLE_BATTERY: usize = 22;
    pub const STRESS_BATTERY: usize = 24;
    pub const TEMPERATURE: usize = 26;
    pub const TX_POWER: usize = 28;
    pub const CHANNEL: usize = 29;
    pub const FRAME_LEN: usize = 30;

    pub const STATUS_APP: u8 = 0b0000_0001;
    pub const STATUS_MOVING: u8 = 0b0000_0010;
    pub const STATUS_ORIENTATION_SHIFT: u8 = 2;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload too short: {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },
    #[error("unrecognized signature: company id 0x{company_id:04X}, frame type 0x{frame_type:02X}")]
    BadSignature { company_id: u16, frame_type: u8 },
    #[error("rssi {0} is outside -100..=0 and is not the error value 127")]
    InvalidRssi(i16),
}

/// Stateless frame decoder holding the calibration it converts with.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

/// Decode with the default calibration.
pub fn decode(payload: &[u8], rssi: i16) -> Result<Nearable, DecodeError> {
    Decoder::default().decode(payload, rssi)
}

impl Decoder {
    /// Takes the calibration as is. A nonsensical calibration (for example a
    /// non-positive path loss exponent) silently yields `Zone::Unknown`; use
    /// [`Decoder::try_new`] to reject it up front.
    pub fn new(config: DecoderConfig) -> Self {
        Decoder { config }
    }

    pub fn try_new(config: DecoderConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Decoder { config })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn decode(&self, payload: &[u8], rssi: i16) -> Result<Nearable, DecodeError> {
        self.check_signature(payload)?;

        if payload.len() < layout::FRAME_LEN {
            return Err(DecodeError::TooShort {
                len: payload.len(),
                min: layout::FRAME_LEN,
            });
        }

        if rssi != RSSI_ERROR && !(-100..=0).contains(&rssi) {
            return Err(DecodeError::InvalidRssi(rssi));
        }

        let status = payload[layout::STATUS];
        let tx_power = i16::from(payload[layout::TX_POWER] as i8);
        let acceleration = |axis: usize| i16::from(payload[layout::ACCELERATION + axis] as i8);

        let mut identifier = [0u8; 6];
        identifier.copy_from_slice(&payload[layout::IDENTIFIER]);

        let hardware = payload[layout::HARDWARE_VERSION];
        let firmware = &payload[layout::FIRMWARE_VERSION..layout::FIRMWARE_VERSION + 3];

        let nearable = Nearable {
            nearable_type: NearableType::from_code(payload[layout::DEVICE_TYPE]),
            identifier: Identifier::new(identifier),
            hardware_version: format!("{}.{}", hardware >> 4, hardware & 0x0F),
            firmware_version: format!("{}.{}.{}", firmware[0], firmware[1], firmware[2]),
            rssi,
            zone: derive_zone(rssi, tx_power, &self.config.zone),
            idle_battery_voltage: self
                .config
                .battery
                .apply(f64::from(read_u16(payload, layout::IDLE_BATTERY))),
            stress_battery_voltage: self
                .config
                .battery
                .apply(f64::from(read_u16(payload, layout::STRESS_BATTERY))),
            current_motion_state_duration: motion_duration_secs(read_u16(
                payload,
                layout::CURRENT_MOTION,
            )),
            previous_motion_state_duration: motion_duration_secs(read_u16(
                payload,
                layout::PREVIOUS_MOTION,
            )),
            is_moving: status & layout::STATUS_MOVING != 0,
            orientation: Orientation::from_bits(status >> layout::STATUS_ORIENTATION_SHIFT),
            x_acceleration: acceleration(0),
            y_acceleration: acceleration(1),
            z_acceleration: acceleration(2),
            temperature: self
                .config
                .temperature
                .apply(f64::from(read_u16(payload, layout::TEMPERATURE) as i16)),
            tx_power,
            channel: payload[layout::CHANNEL],
            firmware_state: if status & layout::STATUS_APP != 0 {
                FirmwareState::App
            } else {
                FirmwareState::Boot
            },
        };

        debug!(
            "Decoded {} nearable {} (rssi {}, zone {:?})",
            nearable.nearable_type, nearable.identifier, nearable.rssi, nearable.zone
        );

        Ok(nearable)
    }

    fn check_signature(&self, payload: &[u8]) -> Result<(), DecodeError> {
        if payload.len() < layout::SIGNATURE_LEN {
            return Err(DecodeError::TooShort {
                len: payload.len(),
                min: layout::SIGNATURE_LEN,
            });
        }

        let company_id = read_u16(payload, layout::COMPANY_ID);
        let frame_type = payload[layout::FRAME_TYPE];
        let expected = &self.config.signature;
        if company_id != expected.company_id || frame_type != expected.frame_type {
            return Err(DecodeError::BadSignature {
                company_id,
                frame_type,
            });
        }
        Ok(())
    }
}

fn read_u16(payload: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([payload[offset], payload[offset + 1]])
}

/// The two high bits select the unit (seconds, minutes, hours, days), the
/// remaining fourteen hold the count.
fn motion_duration_secs(raw: u16) -> u64 {
    let count = u64::from(raw & 0x3FFF);
    let unit = match raw >> 14 {
        0 => 1,
        1 => 60,
        2 => 60 * 60,
        _ => 24 * 60 * 60,
    };
    count * unit
}
