use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// ISO-8601 timestamp as recorded, plus the instant it denotes.
///
/// An unparsable string is kept verbatim and has no instant; every time
/// computation treats it as invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    raw: String,
    instant: Option<DateTime<Utc>>,
}

impl Timestamp {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let instant = parse_instant(&raw);
        Self { raw, instant }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.instant
    }

    pub fn is_valid(&self) -> bool {
        self.instant.is_some()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self {
            raw: instant.to_rfc3339(),
            instant: Some(instant),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Timestamp::parse(raw))
    }
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    // Recorded files sometimes drop the offset; those are UTC.
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// One recorded telemetry sample for a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSample")]
pub struct TelemetrySample {
    pub timestamp: Timestamp,
    pub device_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: Option<f64>,
    pub course_deg: f64,
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub pressure_kpa: f64,
    pub door_open: bool,
}

impl TelemetrySample {
    pub fn position(&self) -> Position {
        Position {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    pub fn door_status(&self) -> DoorStatus {
        if self.door_open {
            DoorStatus::Open
        } else {
            DoorStatus::Closed
        }
    }
}

/// Wire shape of a sample. Older recordings carry `door_status` strings
/// instead of the `door_open` flag; both fold into the flag.
#[derive(Deserialize)]
struct RawSample {
    timestamp: Timestamp,
    device_id: String,
    latitude: f64,
    longitude: f64,
    #[serde(default, alias = "speed")]
    speed_kmh: Option<f64>,
    course_deg: f64,
    temperature_c: f64,
    humidity_percent: f64,
    pressure_kpa: f64,
    #[serde(default)]
    door_open: Option<bool>,
    #[serde(default)]
    door_status: Option<DoorStatus>,
}

impl TryFrom<RawSample> for TelemetrySample {
    type Error = String;

    fn try_from(raw: RawSample) -> Result<Self, Self::Error> {
        let door_open = match (raw.door_open, raw.door_status) {
            (Some(open), _) => open,
            (None, Some(status)) => status == DoorStatus::Open,
            (None, None) => return Err("missing field `door_open`".to_string()),
        };
        Ok(Self {
            timestamp: raw.timestamp,
            device_id: raw.device_id,
            latitude: raw.latitude,
            longitude: raw.longitude,
            speed_kmh: raw.speed_kmh,
            course_deg: raw.course_deg,
            temperature_c: raw.temperature_c,
            humidity_percent: raw.humidity_percent,
            pressure_kpa: raw.pressure_kpa,
            door_open,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub device_id: String,
    #[serde(rename = "alert_type")]
    pub category: String,
    pub severity: Severity,
    pub message: String,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

/// GeoJSON-style feature collection describing a planned or driven route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<TrackFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFeature {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Truck,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Inactive,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    pub status: DeviceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "timestamp": "2024-03-01T08:00:00Z",
        "device_id": "truck_01",
        "latitude": 60.17,
        "longitude": 24.94,
        "speed_kmh": 42.5,
        "course_deg": 90.0,
        "temperature_c": 4.2,
        "humidity_percent": 55.0,
        "pressure_kpa": 101.3,
        "door_open": false
    }"#;

    #[test]
    fn test_parse_recorded_sample() {
        let sample: TelemetrySample = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(sample.device_id, "truck_01");
        assert_eq!(sample.speed_kmh, Some(42.5));
        assert!(sample.timestamp.is_valid());
        assert_eq!(sample.door_status(), DoorStatus::Closed);
    }

    #[test]
    fn test_missing_speed_is_none() {
        let json = SAMPLE.replace("\"speed_kmh\": 42.5,", "");
        let sample: TelemetrySample = serde_json::from_str(&json).unwrap();
        assert_eq!(sample.speed_kmh, None);

        let json = SAMPLE.replace("42.5", "null");
        let sample: TelemetrySample = serde_json::from_str(&json).unwrap();
        assert_eq!(sample.speed_kmh, None);
    }

    #[test]
    fn test_legacy_door_status_is_normalised() {
        let json = SAMPLE.replace("\"door_open\": false", "\"door_status\": \"open\"");
        let sample: TelemetrySample = serde_json::from_str(&json).unwrap();
        assert!(sample.door_open);

        let out = serde_json::to_value(&sample).unwrap();
        assert_eq!(out["door_open"], Value::Bool(true));
        assert!(out.get("door_status").is_none());
    }

    #[test]
    fn test_missing_door_state_is_rejected() {
        let json = SAMPLE.replace(",\n        \"door_open\": false", "");
        assert!(serde_json::from_str::<TelemetrySample>(&json).is_err());
    }

    #[test]
    fn test_invalid_timestamp_is_kept() {
        let json = SAMPLE.replace("2024-03-01T08:00:00Z", "yesterday");
        let sample: TelemetrySample = serde_json::from_str(&json).unwrap();
        assert!(!sample.timestamp.is_valid());
        assert_eq!(sample.timestamp.as_str(), "yesterday");
    }

    #[test]
    fn test_timestamp_without_offset_is_utc() {
        let ts = Timestamp::parse("2024-03-01T08:00:00.250");
        assert_eq!(
            ts.instant().unwrap().to_rfc3339(),
            "2024-03-01T08:00:00.250+00:00"
        );
    }

    #[test]
    fn test_alert_wire_names() {
        let alert: Alert = serde_json::from_str(
            r#"{"id":"a1","device_id":"truck_01","alert_type":"temperature",
                "severity":"critical","message":"Too warm",
                "timestamp":"2024-03-01T08:00:00Z","value":9.4,"threshold":8.0}"#,
        )
        .unwrap();
        assert_eq!(alert.category, "temperature");
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.threshold, Some(8.0));
    }

    #[test]
    fn test_track_round_trips_type_field() {
        let track: Track = serde_json::from_str(
            r#"{"type":"FeatureCollection","features":[{"type":"Feature",
                "properties":{"name":"route"},
                "geometry":{"type":"LineString","coordinates":[[24.9,60.1],[25.0,60.2]]}}]}"#,
        )
        .unwrap();
        assert_eq!(track.features[0].geometry.coordinates.len(), 2);
        let out = serde_json::to_value(&track).unwrap();
        assert_eq!(out["type"], "FeatureCollection");
    }
}
