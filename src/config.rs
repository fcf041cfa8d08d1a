use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub polling: PollingConfig,
    pub cache: CacheSettings,
    pub security: SecurityConfig,
    pub registry_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub max_json_payload_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Used when a request carries no `X-API-Endpoint` header.
    pub default_endpoint: Option<String>,
    pub request_timeout_secs: u64,
    pub detection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub mj_max_attempts: u32,
    pub hl_max_attempts: u32,
    pub kl_max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    pub model_config_ttl_seconds: u64,
    pub model_config_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
                workers: num_cpus::get(),
                max_json_payload_size: 20_000_000, // 20MB, base64 images and audio
            },
            gateway: GatewayConfig {
                default_endpoint: None,
                request_timeout_secs: 60,
                detection_timeout_secs: 10,
            },
            polling: PollingConfig {
                interval_ms: 5_000,
                mj_max_attempts: 60,
                hl_max_attempts: 120,
                kl_max_attempts: 120,
            },
            cache: CacheSettings {
                model_config_ttl_seconds: 600,
                model_config_entries: 64,
            },
            security: SecurityConfig {
                allowed_origins: vec!["*".to_string()],
            },
            registry_path: None,
        }
    }
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn detection_timeout(&self) -> Duration {
        Duration::from_secs(self.detection_timeout_secs)
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Config::default();

        // Server configuration
        if let Ok(host) = env::var("HOST") {
            config.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            config.server.port = port.parse()?;
        }
        if let Ok(workers) = env::var("WORKERS") {
            config.server.workers = workers.parse()?;
        }
        if let Ok(max_json_payload_size) = env::var("MAX_JSON_PAYLOAD_SIZE") {
            config.server.max_json_payload_size = max_json_payload_size.parse()?;
        }

        // Upstream gateway
        if let Ok(endpoint) = env::var("MAAS_API_ENDPOINT") {
            let endpoint = endpoint.trim().to_string();
            if !endpoint.is_empty() {
                config.gateway.default_endpoint = Some(endpoint);
            }
        }
        if let Ok(timeout) = env::var("REQUEST_TIMEOUT_SECS") {
            config.gateway.request_timeout_secs = timeout.parse()?;
        }
        if let Ok(timeout) = env::var("DETECTION_TIMEOUT_SECS") {
            config.gateway.detection_timeout_secs = timeout.parse()?;
        }

        // Task polling
        if let Ok(interval) = env::var("POLL_INTERVAL_MS") {
            config.polling.interval_ms = interval.parse()?;
        }
        if let Ok(attempts) = env::var("MJ_MAX_ATTEMPTS") {
            config.polling.mj_max_attempts = attempts.parse()?;
        }
        if let Ok(attempts) = env::var("HL_MAX_ATTEMPTS") {
            config.polling.hl_max_attempts = attempts.parse()?;
        }
        if let Ok(attempts) = env::var("KL_MAX_ATTEMPTS") {
            config.polling.kl_max_attempts = attempts.parse()?;
        }

        // Model config cache
        if let Ok(ttl) = env::var("MODEL_CONFIG_TTL_SECS") {
            config.cache.model_config_ttl_seconds = ttl.parse()?;
        }
        if let Ok(entries) = env::var("MODEL_CONFIG_CACHE_ENTRIES") {
            config.cache.model_config_entries = entries.parse()?;
        }

        if let Ok(path) = env::var("MODEL_REGISTRY_PATH") {
            config.registry_path = Some(path);
        }

        // Security configuration
        if let Ok(allowed_origins) = env::var("ALLOWED_ORIGINS") {
            config.security.allowed_origins = allowed_origins
                .split(',')
                .map(|s| s.trim().to_string())
                .collect();
        }

        if config.polling.mj_max_attempts == 0
            || config.polling.hl_max_attempts == 0
            || config.polling.kl_max_attempts == 0
        {
            anyhow::bail!("poll attempt budgets must be greater than zero");
        }

        Ok(config)
    }
}
