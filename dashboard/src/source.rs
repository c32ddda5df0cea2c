use crate::cache::{CacheKey, Cached, ResponseCache};
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::metrics::{
    CACHE_HITS_TOTAL, FETCHES_TOTAL, FETCH_FAILURES_TOTAL, FETCH_LATENCY_SECONDS,
    UPLOADS_REJECTED_TOTAL,
};
use crate::model::{Alert, DeviceInfo, TelemetrySample, Track};
use crate::upload::{parse_upload, UploadStore};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Retrieves raw payloads by location.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>>;
}

/// Fetches `http(s)://` locations over HTTP and anything else (`file://`
/// URLs or bare paths) from the local filesystem.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: reqwest::Client,
}

impl RemoteFetcher {
    pub fn new(timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for RemoteFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let response = self.client.get(location).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::Status {
                    url: location.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(response.bytes().await?.to_vec())
        } else {
            let path = location.strip_prefix("file://").unwrap_or(location);
            Ok(tokio::fs::read(path).await?)
        }
    }
}

/// Supplies telemetry, alerts and the route track to the dashboard.
///
/// Failures never propagate to callers except for an unknown device id:
/// telemetry degrades to an empty sequence, alerts to an empty list and the
/// track to `None`. Only successful responses are cached.
///
/// Concurrent misses on the same key share one fetch. A telemetry response is
/// only cached if the upload slot did not change while it was in flight.
pub struct DataService<F = RemoteFetcher> {
    config: Config,
    fetcher: F,
    cache: RwLock<ResponseCache>,
    upload: RwLock<UploadStore>,
    in_flight: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl DataService<RemoteFetcher> {
    pub fn from_config(config: Config) -> Result<Self> {
        let fetcher = RemoteFetcher::new(config.fetch_timeout)?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: Fetch> DataService<F> {
    pub fn new(config: Config, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            cache: RwLock::new(ResponseCache::new()),
            upload: RwLock::new(UploadStore::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.config.devices.iter().map(|d| d.info.clone()).collect()
    }

    pub async fn fetch_telemetry(&self, device_id: &str) -> Result<Arc<Vec<TelemetrySample>>> {
        if let Some(samples) = self.cached_telemetry(device_id).await {
            return Ok(samples);
        }

        let key = CacheKey::Telemetry(device_id.to_string());
        let (generation, uploaded) = self.uploaded_telemetry().await;
        if let Some(samples) = uploaded {
            let samples = Arc::new(samples);
            self.store_telemetry(generation, key, &samples).await;
            info!("Serving {} uploaded samples for {}", samples.len(), device_id);
            return Ok(samples);
        }

        let source = self
            .config
            .device(device_id)
            .ok_or_else(|| Error::UnknownDevice(device_id.to_string()))?;

        let lock = self.key_lock(&key).await;
        let _guard = lock.lock().await;
        if let Some(samples) = self.cached_telemetry(device_id).await {
            return Ok(samples);
        }

        match self.fetch_json::<Vec<TelemetrySample>>(&source.url).await {
            Ok(samples) => {
                let samples = Arc::new(samples);
                self.store_telemetry(generation, key, &samples).await;
                Ok(samples)
            }
            Err(e) => {
                error!("Error fetching telemetry for {}: {}", device_id, e);
                FETCH_FAILURES_TOTAL.inc();
                Ok(Arc::new(Vec::new()))
            }
        }
    }

    pub async fn fetch_alerts(&self) -> Arc<Vec<Alert>> {
        if let Some(alerts) = self.cached_alerts().await {
            return alerts;
        }

        let lock = self.key_lock(&CacheKey::Alerts).await;
        let _guard = lock.lock().await;
        if let Some(alerts) = self.cached_alerts().await {
            return alerts;
        }

        match self.fetch_json::<Vec<Alert>>(&self.config.alerts_url).await {
            Ok(alerts) => {
                let alerts = Arc::new(alerts);
                self.store(CacheKey::Alerts, Cached::Alerts(Arc::clone(&alerts)))
                    .await;
                alerts
            }
            Err(e) => {
                error!("Error fetching alerts: {}", e);
                FETCH_FAILURES_TOTAL.inc();
                Arc::new(Vec::new())
            }
        }
    }

    pub async fn fetch_track(&self) -> Option<Arc<Track>> {
        if let Some(track) = self.cached_track().await {
            return Some(track);
        }

        let lock = self.key_lock(&CacheKey::Track).await;
        let _guard = lock.lock().await;
        if let Some(track) = self.cached_track().await {
            return Some(track);
        }

        match self.fetch_json::<Track>(&self.config.track_url).await {
            Ok(track) => {
                let track = Arc::new(track);
                self.store(CacheKey::Track, Cached::Track(Arc::clone(&track)))
                    .await;
                Some(track)
            }
            Err(e) => {
                error!("Error fetching track: {}", e);
                FETCH_FAILURES_TOTAL.inc();
                None
            }
        }
    }

    /// Installs an uploaded telemetry payload after validating it. Cached
    /// telemetry is dropped so the next fetch picks the upload up.
    pub async fn set_upload(&self, raw: String) -> Result<usize> {
        let count = match parse_upload(&raw) {
            Ok(samples) => samples.len(),
            Err(e) => {
                UPLOADS_REJECTED_TOTAL.inc();
                warn!("Rejected uploaded telemetry: {}", e);
                return Err(e);
            }
        };
        // the slot must change before the cache is invalidated, see store_telemetry
        self.upload.write().await.set(raw);
        let dropped = self.cache.write().await.invalidate_telemetry();
        info!(
            "Installed uploaded telemetry ({} samples), dropped {} cached sequences",
            count, dropped
        );
        Ok(count)
    }

    pub async fn clear_upload(&self) -> bool {
        let removed = self.upload.write().await.clear();
        if removed {
            self.cache.write().await.invalidate_telemetry();
            info!("Cleared uploaded telemetry");
        }
        removed
    }

    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        let entries = cache.len();
        cache.clear();
        info!("Cleared {} cached responses", entries);
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn cached_telemetry(&self, device_id: &str) -> Option<Arc<Vec<TelemetrySample>>> {
        let samples = self.cache.read().await.telemetry(device_id)?;
        CACHE_HITS_TOTAL.inc();
        debug!("Telemetry for {} served from cache", device_id);
        Some(samples)
    }

    async fn cached_alerts(&self) -> Option<Arc<Vec<Alert>>> {
        let alerts = self.cache.read().await.alerts()?;
        CACHE_HITS_TOTAL.inc();
        Some(alerts)
    }

    async fn cached_track(&self) -> Option<Arc<Track>> {
        let track = self.cache.read().await.track()?;
        CACHE_HITS_TOTAL.inc();
        Some(track)
    }

    /// Upload generation together with the parsed upload, if any.
    async fn uploaded_telemetry(&self) -> (u64, Option<Vec<TelemetrySample>>) {
        let upload = self.upload.read().await;
        let samples = upload.raw().and_then(|raw| match parse_upload(raw) {
            Ok(samples) => Some(samples),
            Err(e) => {
                error!("Error parsing custom telemetry data: {}", e);
                None
            }
        });
        (upload.generation(), samples)
    }

    async fn key_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut locks = self.in_flight.lock().await;
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    async fn store(&self, key: CacheKey, value: Cached) {
        self.cache.write().await.insert(key, value);
    }

    /// Caches telemetry read under upload `generation`, unless the upload
    /// slot has changed since. Holding the cache lock while checking orders
    /// this against the invalidation in `set_upload` and `clear_upload`.
    async fn store_telemetry(
        &self,
        generation: u64,
        key: CacheKey,
        samples: &Arc<Vec<TelemetrySample>>,
    ) {
        let mut cache = self.cache.write().await;
        if self.upload.read().await.generation() != generation {
            debug!("Upload changed while fetching {:?}, not caching", key);
            return;
        }
        cache.insert(key, Cached::Telemetry(Arc::clone(samples)));
    }

    async fn fetch_json<T: DeserializeOwned>(&self, location: &str) -> Result<T> {
        FETCHES_TOTAL.inc();
        let timer = FETCH_LATENCY_SECONDS.start_timer();
        let payload = self.fetcher.fetch(location).await?;
        let value = serde_json::from_slice(&payload)?;
        timer.observe_duration();
        debug!("Fetched {} bytes from {}", payload.len(), location);
        Ok(value)
    }
}
