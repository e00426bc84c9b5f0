use std::path::Path;

use anyhow::{Context as _, ensure};
use mac_address::MacAddress;
use serde_derive::Deserialize;

use crate::model::NearableType;

#[derive(Deserialize, Debug, Default, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub decoder: DecoderConfig,
    pub manager: Option<ManagerConfig>,
    pub nearables: Option<Vec<KnownNearable>>,
    pub mqtt: Option<MqttConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub publisher_id: Option<String>,
    pub topic_path: Option<String>,
    pub keep_alive_seconds: Option<u64>,
}

/// Vendor calibration data and frame signature used by the decoder.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DecoderConfig {
    #[serde(default)]
    pub signature: Signature,
    #[serde(default)]
    pub zone: ZoneCalibration,
    #[serde(default = "LinearScale::battery")]
    pub battery: LinearScale,
    #[serde(default = "LinearScale::temperature")]
    pub temperature: LinearScale,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            signature: Signature::default(),
            zone: ZoneCalibration::default(),
            battery: LinearScale::battery(),
            temperature: LinearScale::temperature(),
        }
    }
}

/// Leading bytes every nearable frame starts with.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Signature {
    /// https://bitbucket.org/bluetooth-SIG/public/src/main/assigned_numbers/company_identifiers/company_identifiers.yaml
    pub company_id: u16,
    pub frame_type: u8,
}

impl Default for Signature {
    fn default() -> Self {
        Signature {
            company_id: 0x015D,
            frame_type: 0x01,
        }
    }
}

/// Coefficients of the log-distance path loss model and the zone boundaries.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ZoneCalibration {
    pub path_loss_exponent: f64,
    pub immediate_max_meters: f64,
    pub near_max_meters: f64,
    pub min_tx_power: i16,
    pub max_tx_power: i16,
}

impl Default for ZoneCalibration {
    fn default() -> Self {
        ZoneCalibration {
            path_loss_exponent: 2.0,
            immediate_max_meters: 0.5,
            near_max_meters: 3.0,
            min_tx_power: -100,
            max_tx_power: 20,
        }
    }
}

/// `raw * scale + offset`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
}

impl LinearScale {
    /// Millivolts to volts.
    pub fn battery() -> Self {
        LinearScale {
            scale: 0.001,
            offset: 0.0,
        }
    }

    /// 1/16 °C fixed point to °C.
    pub fn temperature() -> Self {
        LinearScale {
            scale: 0.0625,
            offset: 0.0,
        }
    }

    pub fn apply(&self, raw: f64) -> f64 {
        raw * self.scale + self.offset
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ManagerConfig {
    /// Device types to report. Absent or empty means every type.
    pub types: Option<Vec<NearableType>>,
    pub channel_capacity: Option<usize>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct KnownNearable {
    pub identifier: MacAddress,
    pub name: String,
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: AppConfig = toml::de::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.decoder.validate().context("invalid [decoder] section")
    }
}

impl DecoderConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let zone = &self.zone;
        ensure!(
            zone.path_loss_exponent > 0.0,
            "path_loss_exponent must be positive, got {}",
            zone.path_loss_exponent
        );
        ensure!(
            zone.immediate_max_meters > 0.0 && zone.immediate_max_meters < zone.near_max_meters,
            "zone thresholds must satisfy 0 < immediate_max_meters ({}) < near_max_meters ({})",
            zone.immediate_max_meters,
            zone.near_max_meters
        );
        ensure!(
            zone.min_tx_power <= zone.max_tx_power,
            "min_tx_power ({}) is above max_tx_power ({})",
            zone.min_tx_power,
            zone.max_tx_power
        );
        ensure!(self.battery.scale != 0.0, "battery scale must not be zero");
        ensure!(
            self.temperature.scale != 0.0,
            "temperature scale must not be zero"
        );
        Ok(())
    }
}
