use crate::config::ZoneCalibration;
use crate::model::Zone;

/// RSSI value reported when the signal strength could not be read.
pub const RSSI_ERROR: i16 = 127;

/// Estimated distance in meters from the log-distance path loss model,
/// with `tx_power` as the calibrated power at one meter.
///
/// `None` when the RSSI is the error sentinel, `tx_power` is outside the
/// calibrated range, or the calibration has no usable exponent.
pub fn estimate_distance(rssi: i16, tx_power: i16, calibration: &ZoneCalibration) -> Option<f64> {
    if rssi == RSSI_ERROR {
        return None;
    }
    if !(calibration.min_tx_power..=calibration.max_tx_power).contains(&tx_power) {
        return None;
    }
    if calibration.path_loss_exponent <= 0.0 {
        return None;
    }

    let path_loss = f64::from(tx_power) - f64::from(rssi);
    Some(10f64.powf(path_loss / (10.0 * calibration.path_loss_exponent)))
}

pub fn derive_zone(rssi: i16, tx_power: i16, calibration: &ZoneCalibration) -> Zone {
    match estimate_distance(rssi, tx_power, calibration) {
        None => Zone::Unknown,
        Some(d) if d < calibration.immediate_max_meters => Zone::Immediate,
        Some(d) if d <= calibration.near_max_meters => Zone::Near,
        Some(_) => Zone::Far,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank(zone: Zone) -> u8 {
        match zone {
            Zone::Immediate => 0,
            Zone::Near => 1,
            Zone::Far => 2,
            Zone::Unknown => panic!("unexpected unknown zone"),
        }
    }

    #[test]
    fn test_distance_at_reference_power() {
        let calibration = ZoneCalibration::default();
        let d = estimate_distance(-59, -59, &calibration).unwrap();
        assert!((d - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zones() {
        let calibration = ZoneCalibration::default();
        assert_eq!(derive_zone(-50, -59, &calibration), Zone::Immediate);
        assert_eq!(derive_zone(-65, -59, &calibration), Zone::Near);
        assert_eq!(derive_zone(-90, -59, &calibration), Zone::Far);
    }

    #[test]
    fn test_rssi_error_is_unknown() {
        let calibration = ZoneCalibration::default();
        for tx_power in -100..=20 {
            assert_eq!(derive_zone(RSSI_ERROR, tx_power, &calibration), Zone::Unknown);
        }
    }

    #[test]
    fn test_out_of_range_tx_power_is_unknown() {
        let calibration = ZoneCalibration::default();
        assert_eq!(derive_zone(-65, 21, &calibration), Zone::Unknown);
        assert_eq!(derive_zone(-65, -101, &calibration), Zone::Unknown);
        assert_eq!(derive_zone(-65, 127, &calibration), Zone::Unknown);
    }

    #[test]
    fn test_zone_monotonic_in_rssi() {
        let calibration = ZoneCalibration::default();
        for tx_power in [-80, -59, -30, 0, 4] {
            let mut previous = rank(derive_zone(0, tx_power, &calibration));
            for rssi in (-100..0).rev() {
                let current = rank(derive_zone(rssi, tx_power, &calibration));
                assert!(
                    current >= previous,
                    "rssi {} tx_power {} moved closer",
                    rssi,
                    tx_power
                );
                previous = current;
            }
        }
    }

    #[test]
    fn test_custom_coefficients() {
        let calibration = ZoneCalibration {
            path_loss_exponent: 4.0,
            ..Default::default()
        };
        // 12 dB of loss is ~2 m with n=4, ~4 m with n=2
        assert_eq!(derive_zone(-71, -59, &calibration), Zone::Near);
        assert_eq!(derive_zone(-71, -59, &ZoneCalibration::default()), Zone::Far);
    }
}
