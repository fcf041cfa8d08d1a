use chrono::{Duration as ChronoDuration, Utc};
use futures_util::future::join_all;
use lru::LruCache;
use reqwest::Client;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{CacheSettings, GatewayConfig};
use crate::error::{GatewayError, Result};
use crate::models::{DetectionMethod, ModelConfig, ModelConfigEntry, ModelKind};
use crate::services::{Credentials, GatewayClient, ModelRegistry};
use crate::utils::{cache_key, first_string_at, join_segments};

/// Time-bounded cache of detected model → endpoint mappings, one entry per
/// credential pair.
///
/// A miss is refreshed at most once at a time per key: concurrent callers
/// wait on the refresh and then read its result instead of probing the
/// gateway again.
#[derive(Clone)]
pub struct ModelConfigService {
    http: Client,
    registry: Arc<ModelRegistry>,
    ttl: ChronoDuration,
    detection_timeout: Duration,
    entries: Arc<Mutex<LruCache<String, ModelConfigEntry>>>,
    refresh_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl ModelConfigService {
    pub fn new(
        http: Client,
        registry: Arc<ModelRegistry>,
        settings: &CacheSettings,
        gateway: &GatewayConfig,
    ) -> Self {
        let capacity = NonZeroUsize::new(settings.model_config_entries.max(1))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            http,
            registry,
            ttl: ChronoDuration::seconds(settings.model_config_ttl_seconds as i64),
            detection_timeout: gateway.detection_timeout(),
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            refresh_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get(&self, credentials: &Credentials) -> ModelConfigEntry {
        let key = cache_key(&[&credentials.endpoint, &credentials.api_key]);
        if let Some(entry) = self.cached(&key).await {
            return entry;
        }

        let lock = self
            .refresh_locks
            .lock()
            .await
            .entry(key.clone())
            .or_default()
            .clone();
        let _guard = lock.lock().await;

        if let Some(entry) = self.cached(&key).await {
            debug!("model configs filled by a concurrent refresh");
            return entry;
        }

        let entry = match self.detect(credentials).await {
            Some(entry) => {
                self.entries.lock().await.put(key.clone(), entry.clone());
                entry
            }
            None => self.static_entry(),
        };
        self.refresh_locks.lock().await.remove(&key);
        entry
    }

    /// Registry table served when detection yields nothing. Not cached, so
    /// the next request tries detection again.
    fn static_entry(&self) -> ModelConfigEntry {
        ModelConfigEntry {
            model_configs: self.registry.static_configs(),
            detection_method: DetectionMethod::Static,
            timestamp: Utc::now(),
        }
    }

    async fn cached(&self, key: &str) -> Option<ModelConfigEntry> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get(key) {
            if Utc::now() - entry.timestamp < self.ttl {
                return Some(entry.clone());
            }
        }
        entries.pop(key);
        None
    }

    async fn detect(&self, credentials: &Credentials) -> Option<ModelConfigEntry> {
        let client = GatewayClient::new(self.http.clone(), credentials.clone());

        let (model_configs, detection_method) = match self.from_config_api(&client).await {
            Ok(configs) => (configs, DetectionMethod::ConfigApi),
            Err(e) => {
                debug!(error = %e, "config API unavailable, probing models");
                match self.from_model_probes(&client).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(error = %e, "model detection failed, serving the static table");
                        return None;
                    }
                }
            }
        };
        if model_configs.is_empty() {
            warn!("model list was empty, serving the static table");
            return None;
        }

        info!(
            models = model_configs.len(),
            method = ?detection_method,
            "model configs detected"
        );
        Some(ModelConfigEntry {
            model_configs,
            detection_method,
            timestamp: Utc::now(),
        })
    }

    async fn from_config_api(
        &self,
        client: &GatewayClient,
    ) -> Result<BTreeMap<String, ModelConfig>> {
        let url = client.credentials().url("/v1/models/config");
        let reply = client.get_json(&url, Some(self.detection_timeout)).await?;
        if !reply.is_success() {
            return Err(GatewayError::ConfigDetection(format!(
                "config API returned {}",
                reply.status
            )));
        }
        let mapping = reply.body.get("data").cloned().unwrap_or(reply.body);
        let configs: BTreeMap<String, ModelConfig> = serde_json::from_value(mapping)
            .map_err(|e| GatewayError::ConfigDetection(format!("config API body: {e}")))?;
        if configs.is_empty() {
            return Err(GatewayError::ConfigDetection(
                "config API returned no models".to_string(),
            ));
        }
        Ok(configs)
    }

    async fn from_model_probes(
        &self,
        client: &GatewayClient,
    ) -> Result<(BTreeMap<String, ModelConfig>, DetectionMethod)> {
        let url = client.credentials().url("/v1/models");
        let reply = client.get_json(&url, Some(self.detection_timeout)).await?;
        if !reply.is_success() {
            return Err(GatewayError::ConfigDetection(format!(
                "model list returned {}",
                reply.status
            )));
        }
        let ids: Vec<String> = reply
            .body
            .get("data")
            .and_then(Value::as_array)
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .ok_or_else(|| GatewayError::ConfigDetection("model list without data".to_string()))?;

        let probes = ids.iter().map(|id| async move {
            if !self.registry.is_media(id) {
                return (id.clone(), None);
            }
            match self.probe(client, id).await {
                Ok(config) => (id.clone(), Some(config)),
                Err(e) => {
                    debug!(model = %id, error = %e, "model probe failed, using static config");
                    (id.clone(), None)
                }
            }
        });

        let mut probed_any = false;
        let mut configs = BTreeMap::new();
        for (id, probed) in join_all(probes).await {
            let config = match probed {
                Some(config) => {
                    probed_any = true;
                    config
                }
                None => self.registry.static_config(&id),
            };
            configs.insert(id, config);
        }

        let method = if probed_any {
            DetectionMethod::ModelProbe
        } else {
            DetectionMethod::Static
        };
        Ok((configs, method))
    }

    async fn probe(&self, client: &GatewayClient, model_id: &str) -> Result<ModelConfig> {
        let url = join_segments(&client.credentials().url("/v1/models"), &[model_id])?;
        let reply = client.get_json(&url, Some(self.detection_timeout)).await?;
        if !reply.is_success() {
            return Err(GatewayError::ConfigDetection(format!(
                "detail for {} returned {}",
                model_id, reply.status
            )));
        }
        let body = &reply.body;
        let endpoint = first_string_at(body, &["/endpoint", "/endpoint_path", "/data/endpoint"])
            .ok_or_else(|| {
                GatewayError::ConfigDetection(format!("detail for {} has no endpoint", model_id))
            })?;
        let kind = first_string_at(body, &["/type", "/data/type"])
            .and_then(|t| serde_json::from_value::<ModelKind>(Value::String(t)).ok())
            .unwrap_or_else(|| self.registry.resolve(model_id).kind);
        Ok(ModelConfig {
            endpoint,
            kind,
            real_model_id: first_string_at(
                body,
                &["/realModelId", "/real_model_id", "/data/realModelId"],
            ),
        })
    }
}
