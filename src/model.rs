use std::fmt;

use mac_address::MacAddress;
use serde::Serializer;
use serde_derive::{Deserialize, Serialize};

/// Kind of object the nearable is sold for, as printed on the enclosure.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NearableType {
    #[default]
    Unknown,
    Dog,
    Car,
    Fridge,
    Bag,
    Bike,
    Chair,
    Bed,
    Door,
    Shoe,
    Generic,
}

impl NearableType {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => NearableType::Dog,
            2 => NearableType::Car,
            3 => NearableType::Fridge,
            4 => NearableType::Bag,
            5 => NearableType::Bike,
            6 => NearableType::Chair,
            7 => NearableType::Bed,
            8 => NearableType::Door,
            9 => NearableType::Shoe,
            10 => NearableType::Generic,
            _ => NearableType::Unknown,
        }
    }
}

/// Display name for a nearable type.
pub fn type_name(nearable_type: NearableType) -> &'static str {
    match nearable_type {
        NearableType::Unknown => "Unknown",
        NearableType::Dog => "Dog",
        NearableType::Car => "Car",
        NearableType::Fridge => "Fridge",
        NearableType::Bag => "Bag",
        NearableType::Bike => "Bike",
        NearableType::Chair => "Chair",
        NearableType::Bed => "Bed",
        NearableType::Door => "Door",
        NearableType::Shoe => "Shoe",
        NearableType::Generic => "Generic",
    }
}

impl fmt::Display for NearableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(type_name(*self))
    }
}

/// Physical orientation of the device in space.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Unknown,
    Horizontal,
    HorizontalUpsideDown,
    Vertical,
    VerticalUpsideDown,
    LeftSide,
    RightSide,
}

impl Orientation {
    /// Only the low three bits are looked at.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            1 => Orientation::Horizontal,
            2 => Orientation::HorizontalUpsideDown,
            3 => Orientation::Vertical,
            4 => Orientation::VerticalUpsideDown,
            5 => Orientation::LeftSide,
            6 => Orientation::RightSide,
            _ => Orientation::Unknown,
        }
    }
}

/// Coarse proximity classification derived from signal strength.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    #[default]
    Unknown,
    Immediate,
    Near,
    Far,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirmwareState {
    #[default]
    Boot,
    App,
}

/// Six byte device identifier, unique among all nearables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier(MacAddress);

impl Identifier {
    pub fn new(bytes: [u8; 6]) -> Self {
        Identifier(MacAddress::new(bytes))
    }

    pub fn bytes(&self) -> [u8; 6] {
        self.0.bytes()
    }

    pub fn mac_address(&self) -> MacAddress {
        self.0
    }
}

impl From<MacAddress> for Identifier {
    fn from(mac: MacAddress) -> Self {
        Identifier(mac)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One decoded advertisement. Built by the decoder, never mutated afterwards.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Nearable {
    pub(crate) nearable_type: NearableType,
    pub(crate) identifier: Identifier,
    pub(crate) hardware_version: String,
    pub(crate) firmware_version: String,
    pub(crate) rssi: i16,
    pub(crate) zone: Zone,
    pub(crate) idle_battery_voltage: f64,
    pub(crate) stress_battery_voltage: f64,
    pub(crate) current_motion_state_duration: u64,
    pub(crate) previous_motion_state_duration: u64,
    pub(crate) is_moving: bool,
    pub(crate) orientation: Orientation,
    pub(crate) x_acceleration: i16,
    pub(crate) y_acceleration: i16,
    pub(crate) z_acceleration: i16,
    pub(crate) temperature: f64,
    pub(crate) tx_power: i16,
    pub(crate) channel: u8,
    pub(crate) firmware_state: FirmwareState,
}

impl Nearable {
    pub fn nearable_type(&self) -> NearableType {
        self.nearable_type
    }

    pub fn identifier(&self) -> Identifier {
        self.identifier
    }

    pub fn hardware_version(&self) -> &str {
        &self.hardware_version
    }

    pub fn firmware_version(&self) -> &str {
        &self.firmware_version
    }

    /// -100..=0, or 127 when the reading failed.
    pub fn rssi(&self) -> i16 {
        self.rssi
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Volts while idle.
    pub fn idle_battery_voltage(&self) -> f64 {
        self.idle_battery_voltage
    }

    /// Volts while transmitting.
    pub fn stress_battery_voltage(&self) -> f64 {
        self.stress_battery_voltage
    }

    /// Seconds since `is_moving` last changed.
    pub fn current_motion_state_duration(&self) -> u64 {
        self.current_motion_state_duration
    }

    /// Seconds the previous motion state lasted.
    pub fn previous_motion_state_duration(&self) -> u64 {
        self.previous_motion_state_duration
    }

    pub fn is_moving(&self) -> bool {
        self.is_moving
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn x_acceleration(&self) -> i16 {
        self.x_acceleration
    }

    pub fn y_acceleration(&self) -> i16 {
        self.y_acceleration
    }

    pub fn z_acceleration(&self) -> i16 {
        self.z_acceleration
    }

    /// Degrees Celsius.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// dBm.
    pub fn tx_power(&self) -> i16 {
        self.tx_power
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn firmware_state(&self) -> FirmwareState {
        self.firmware_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_from_code() {
        assert_eq!(NearableType::from_code(0), NearableType::Unknown);
        assert_eq!(NearableType::from_code(1), NearableType::Dog);
        assert_eq!(NearableType::from_code(10), NearableType::Generic);
        assert_eq!(NearableType::from_code(11), NearableType::Unknown);
        assert_eq!(NearableType::from_code(0xFF), NearableType::Unknown);
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name(NearableType::Fridge), "Fridge");
        assert_eq!(NearableType::Shoe.to_string(), "Shoe");
        assert_eq!(type_name(NearableType::default()), "Unknown");
    }

    #[test]
    fn test_orientation_from_bits() {
        assert_eq!(Orientation::from_bits(0), Orientation::Unknown);
        assert_eq!(Orientation::from_bits(3), Orientation::Vertical);
        assert_eq!(Orientation::from_bits(6), Orientation::RightSide);
        assert_eq!(Orientation::from_bits(7), Orientation::Unknown);
        // higher bits belong to other fields
        assert_eq!(Orientation::from_bits(0b1000_0001), Orientation::Horizontal);
    }

    #[test]
    fn test_identifier_display() {
        let id = Identifier::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(id.to_string(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"AA:BB:CC:DD:EE:FF\""
        );
        assert_eq!(id.bytes(), [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }

    #[test]
    fn test_type_deserialize_by_name() {
        let parsed: Vec<NearableType> = serde_json::from_str(r#"["Dog", "Bike"]"#).unwrap();
        assert_eq!(parsed, vec![NearableType::Dog, NearableType::Bike]);
    }
}
