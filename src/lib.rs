//! Decoding of nearable BLE beacon advertisements.
//!
//! [`decode`] turns the manufacturer data of one advertisement and the RSSI
//! it was received at into an immutable [`Nearable`]. Everything else in the
//! crate is plumbing around it: calibration config, a manager that caches
//! records per identifier, a capture reader and an MQTT sink.

pub mod config;
pub mod decoder;
pub mod input;
pub mod manager;
pub mod messages;
pub mod model;
pub mod mqtt;
pub mod zone;

#[cfg(test)]
mod fixtures;

pub use decoder::{DecodeError, Decoder, decode};
pub use model::{
    FirmwareState, Identifier, Nearable, NearableType, Orientation, Zone, type_name,
};
