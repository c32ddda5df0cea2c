use crate::model::{Alert, TelemetrySample, Track};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Telemetry(String),
    Alerts,
    Track,
}

#[derive(Debug, Clone)]
pub enum Cached {
    Telemetry(Arc<Vec<TelemetrySample>>),
    Alerts(Arc<Vec<Alert>>),
    Track(Arc<Track>),
}

/// Responses of successful fetches, keyed by what was requested.
///
/// Entries live until they are invalidated or the whole cache is cleared.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<CacheKey, Cached>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&Cached> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: CacheKey, value: Cached) {
        self.entries.insert(key, value);
    }

    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drops every cached telemetry sequence, keeping alerts and track.
    pub fn invalidate_telemetry(&mut self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|key, _| !matches!(key, CacheKey::Telemetry(_)));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn telemetry(&self, device_id: &str) -> Option<Arc<Vec<TelemetrySample>>> {
        match self.get(&CacheKey::Telemetry(device_id.to_string())) {
            Some(Cached::Telemetry(samples)) => Some(Arc::clone(samples)),
            _ => None,
        }
    }

    pub fn alerts(&self) -> Option<Arc<Vec<Alert>>> {
        match self.get(&CacheKey::Alerts) {
            Some(Cached::Alerts(alerts)) => Some(Arc::clone(alerts)),
            _ => None,
        }
    }

    pub fn track(&self) -> Option<Arc<Track>> {
        match self.get(&CacheKey::Track) {
            Some(Cached::Track(track)) => Some(Arc::clone(track)),
            _ => None,
        }
    }
}
