use crate::errors::{Error, Result};
use crate::model::TelemetrySample;

const LATITUDE_MIN: f64 = -90.0;
const LATITUDE_MAX: f64 = 90.0;
const LONGITUDE_MIN: f64 = -180.0;
const LONGITUDE_MAX: f64 = 180.0;
const COURSE_MIN: f64 = 0.0;
const COURSE_MAX: f64 = 360.0;
const HUMIDITY_MIN: f64 = 0.0;
const HUMIDITY_MAX: f64 = 100.0;

/// Validates a telemetry sample
pub fn validate(sample: &TelemetrySample) -> Result<()> {
    // Validate device_id
    if sample.device_id.is_empty() {
        return Err(Error::Validation("Device ID cannot be empty".to_string()));
    }

    // Validate position
    if !(LATITUDE_MIN..=LATITUDE_MAX).contains(&sample.latitude) {
        return Err(Error::Validation(format!(
            "Latitude {} out of range [{}, {}]",
            sample.latitude, LATITUDE_MIN, LATITUDE_MAX
        )));
    }
    if !(LONGITUDE_MIN..=LONGITUDE_MAX).contains(&sample.longitude) {
        return Err(Error::Validation(format!(
            "Longitude {} out of range [{}, {}]",
            sample.longitude, LONGITUDE_MIN, LONGITUDE_MAX
        )));
    }

    // Validate heading
    if !(COURSE_MIN..=COURSE_MAX).contains(&sample.course_deg) {
        return Err(Error::Validation(format!(
            "Course {} out of range [{}, {}]",
            sample.course_deg, COURSE_MIN, COURSE_MAX
        )));
    }

    // Validate speed
    if let Some(speed) = sample.speed_kmh {
        if !(speed >= 0.0) {
            return Err(Error::Validation(format!("Speed {} must not be negative", speed)));
        }
    }

    // Validate temperature
    if !converter::is_valid(sample.temperature_c, converter::Unit::Celsius) {
        return Err(Error::Validation(format!(
            "Temperature {} is below absolute zero",
            sample.temperature_c
        )));
    }

    // Validate humidity
    if !(HUMIDITY_MIN..=HUMIDITY_MAX).contains(&sample.humidity_percent) {
        return Err(Error::Validation(format!(
            "Humidity {} out of range [{}, {}]",
            sample.humidity_percent, HUMIDITY_MIN, HUMIDITY_MAX
        )));
    }

    // Validate pressure
    if !(sample.pressure_kpa >= 0.0) {
        return Err(Error::Validation(format!(
            "Pressure {} must not be negative",
            sample.pressure_kpa
        )));
    }

    Ok(())
}

/// Validates every sample of an uploaded sequence, reporting the first
/// offending index.
pub fn validate_sequence(samples: &[TelemetrySample]) -> Result<()> {
    if samples.is_empty() {
        return Err(Error::Validation("Telemetry sequence is empty".to_string()));
    }
    for (index, sample) in samples.iter().enumerate() {
        validate(sample).map_err(|e| match e {
            Error::Validation(msg) => Error::Validation(format!("sample {}: {}", index, msg)),
            other => other,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Timestamp;
    use chrono::Utc;

    fn sample() -> TelemetrySample {
        TelemetrySample {
            timestamp: Timestamp::from(Utc::now()),
            device_id: "truck_01".to_string(),
            latitude: 60.17,
            longitude: 24.94,
            speed_kmh: Some(40.0),
            course_deg: 180.0,
            temperature_c: 4.0,
            humidity_percent: 60.0,
            pressure_kpa: 101.3,
            door_open: false,
        }
    }

    #[test]
    fn test_valid_sample() {
        assert!(validate(&sample()).is_ok());
        let no_speed = TelemetrySample {
            speed_kmh: None,
            ..sample()
        };
        assert!(validate(&no_speed).is_ok());
    }

    #[test]
    fn test_invalid_latitude() {
        let sample = TelemetrySample {
            latitude: 91.0, // Out of range
            ..sample()
        };
        assert!(validate(&sample).is_err());
    }

    #[test]
    fn test_invalid_longitude() {
        let sample = TelemetrySample {
            longitude: -181.0, // Out of range
            ..sample()
        };
        assert!(validate(&sample).is_err());
    }

    #[test]
    fn test_invalid_humidity() {
        let sample = TelemetrySample {
            humidity_percent: 150.0, // Out of range
            ..sample()
        };
        assert!(validate(&sample).is_err());
    }

    #[test]
    fn test_negative_speed() {
        let sample = TelemetrySample {
            speed_kmh: Some(-1.0),
            ..sample()
        };
        assert!(validate(&sample).is_err());
    }

    #[test]
    fn test_nan_pressure() {
        let sample = TelemetrySample {
            pressure_kpa: f64::NAN,
            ..sample()
        };
        assert!(validate(&sample).is_err());
    }

    #[test]
    fn test_temperature_below_absolute_zero() {
        let sample = TelemetrySample {
            temperature_c: -300.0,
            ..sample()
        };
        assert!(validate(&sample).is_err());
    }

    #[test]
    fn test_empty_device_id() {
        let sample = TelemetrySample {
            device_id: "".to_string(),
            ..sample()
        };
        assert!(validate(&sample).is_err());
    }

    #[test]
    fn test_sequence_reports_index() {
        let bad = TelemetrySample {
            course_deg: 400.0,
            ..sample()
        };
        let err = validate_sequence(&[sample(), bad]).unwrap_err();
        assert!(err.to_string().contains("sample 1"));
        assert!(validate_sequence(&[]).is_err());
    }
}
