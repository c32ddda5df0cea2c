use crate::errors::Result;
use crate::model::TelemetrySample;
use crate::validate::validate_sequence;

/// Locally supplied telemetry that replaces the network recordings.
///
/// The raw payload is stored as received and parsed again on use, so a
/// sequence served from it is always a fresh copy. `generation` changes on
/// every install or removal.
#[derive(Debug, Default)]
pub struct UploadStore {
    raw: Option<String>,
    generation: u64,
}

impl UploadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set(&mut self, raw: String) {
        self.raw = Some(raw);
        self.generation += 1;
    }

    pub fn clear(&mut self) -> bool {
        let removed = self.raw.take().is_some();
        if removed {
            self.generation += 1;
        }
        removed
    }
}

/// Parses an uploaded payload: a non-empty JSON array of valid samples.
pub fn parse_upload(raw: &str) -> Result<Vec<TelemetrySample>> {
    let samples: Vec<TelemetrySample> = serde_json::from_str(raw)?;
    validate_sequence(&samples)?;
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    const UPLOAD: &str = r#"[{"timestamp":"2024-03-01T08:00:00Z","device_id":"truck_01",
        "latitude":60.1,"longitude":24.9,"speed_kmh":0,"course_deg":0,
        "temperature_c":4.0,"humidity_percent":50,"pressure_kpa":101.2,"door_open":true}]"#;

    #[test]
    fn test_parse_upload() {
        let samples = parse_upload(UPLOAD).unwrap();
        assert_eq!(samples.len(), 1);
        assert!(samples[0].door_open);
    }

    #[test]
    fn test_rejects_non_array_and_empty() {
        assert!(matches!(parse_upload("{}"), Err(Error::Json(_))));
        assert!(matches!(parse_upload("[]"), Err(Error::Validation(_))));
        assert!(parse_upload("not json").is_err());
    }

    #[test]
    fn test_store_set_and_clear() {
        let mut store = UploadStore::new();
        assert!(store.raw().is_none());
        store.set(UPLOAD.to_string());
        assert_eq!(store.raw(), Some(UPLOAD));
        assert!(store.clear());
        assert!(!store.clear());
    }

    #[test]
    fn test_generation_tracks_changes() {
        let mut store = UploadStore::new();
        assert_eq!(store.generation(), 0);
        store.set(UPLOAD.to_string());
        assert_eq!(store.generation(), 1);
        store.clear();
        assert_eq!(store.generation(), 2);
        store.clear();
        assert_eq!(store.generation(), 2);
    }
}
