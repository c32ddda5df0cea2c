use crate::telemetry::{Alert, Feature, Geometry, Severity, Telemetry, Track};
use anyhow::Context;
use serde::Serialize;
use serde_json::{json, Map};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

const TEMP_LOW_C: f64 = 2.0;
const TEMP_HIGH_C: f64 = 8.0;
const TEMP_CRITICAL_C: f64 = 10.0;

/// Alerts a monitoring backend would have raised for the trip: one per
/// excursion entered and one per door opening.
pub fn derive_alerts(trip: &[Telemetry]) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let mut in_excursion = false;
    let mut door_open = false;

    for sample in trip {
        let excursion = sample.temperature_c < TEMP_LOW_C || sample.temperature_c > TEMP_HIGH_C;
        if excursion && !in_excursion {
            let (alert_type, threshold) = if sample.temperature_c > TEMP_HIGH_C {
                ("temperature_high", TEMP_HIGH_C)
            } else {
                ("temperature_low", TEMP_LOW_C)
            };
            let severity = if sample.temperature_c > TEMP_CRITICAL_C {
                Severity::Critical
            } else {
                Severity::Warning
            };
            alerts.push(Alert {
                id: uuid::Uuid::new_v4().to_string(),
                device_id: sample.device_id.clone(),
                alert_type: alert_type.to_string(),
                severity,
                message: format!(
                    "Cargo temperature {:.1} °C outside {}–{} °C",
                    sample.temperature_c, TEMP_LOW_C, TEMP_HIGH_C
                ),
                timestamp: sample.timestamp,
                value: Some(sample.temperature_c),
                threshold: Some(threshold),
            });
        }
        in_excursion = excursion;

        if sample.door_open && !door_open {
            alerts.push(Alert {
                id: uuid::Uuid::new_v4().to_string(),
                device_id: sample.device_id.clone(),
                alert_type: "door_open".to_string(),
                severity: Severity::Info,
                message: "Cargo door opened".to_string(),
                timestamp: sample.timestamp,
                value: None,
                threshold: None,
            });
        }
        door_open = sample.door_open;
    }

    alerts
}

/// The driven route as a single LineString, coordinates in GeoJSON
/// `[longitude, latitude]` order.
pub fn derive_track(trip: &[Telemetry]) -> Track {
    let mut properties = Map::new();
    if let Some(first) = trip.first() {
        properties.insert("device_id".to_string(), json!(first.device_id));
    }
    properties.insert("samples".to_string(), json!(trip.len()));

    Track {
        kind: "FeatureCollection".to_string(),
        features: vec![Feature {
            kind: "Feature".to_string(),
            properties,
            geometry: Geometry {
                kind: "LineString".to_string(),
                coordinates: trip
                    .iter()
                    .map(|s| vec![s.longitude, s.latitude])
                    .collect(),
            },
        }],
    }
}

pub struct RecordingPaths {
    pub telemetry: PathBuf,
    pub alerts: PathBuf,
    pub track: PathBuf,
}

pub fn write_recording(dir: &Path, device_id: &str, trip: &[Telemetry]) -> anyhow::Result<RecordingPaths> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let paths = RecordingPaths {
        telemetry: dir.join(format!("{}.json", device_id)),
        alerts: dir.join("alerts.json"),
        track: dir.join("track.json"),
    };

    let alerts = derive_alerts(trip);
    write_json(&paths.telemetry, &trip)?;
    write_json(&paths.alerts, &alerts)?;
    write_json(&paths.track, &derive_track(trip))?;

    info!(
        "Wrote {} samples and {} alerts to {}",
        trip.len(),
        alerts.len(),
        dir.display()
    );
    Ok(paths)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer.flush()?;
    Ok(())
}
