mod config;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use handlers::health::not_found;
use routes::api;
use services::{GenerationService, ModelConfigService, ModelRegistry};

#[derive(Clone)]
pub struct AppState {
    /// Client for JSON calls, bounded by the request timeout.
    pub http: reqwest::Client,
    /// Client for relayed streams, which may outlive any fixed timeout.
    pub stream_http: reqwest::Client,
    pub registry: Arc<ModelRegistry>,
    pub generation: GenerationService,
    pub model_configs: ModelConfigService,
    pub config: Config,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config, registry: ModelRegistry) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.gateway.request_timeout())
            .build()?;
        let stream_http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let registry = Arc::new(registry);

        Ok(Self {
            generation: GenerationService::new(http.clone(), config.polling.clone()),
            model_configs: ModelConfigService::new(
                http.clone(),
                registry.clone(),
                &config.cache,
                &config.gateway,
            ),
            http,
            stream_http,
            registry,
            config,
            start_time: Instant::now(),
        })
    }
}

fn load_registry(config: &Config) -> anyhow::Result<ModelRegistry> {
    match &config.registry_path {
        Some(path) => ModelRegistry::from_file(path),
        None => ModelRegistry::with_defaults(),
    }
}

fn cors(config: &Config) -> Cors {
    let origins = &config.security.allowed_origins;
    let cors = if origins.iter().any(|o| o == "*") {
        Cors::default().allow_any_origin()
    } else {
        origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };
    cors.allow_any_method().allow_any_header().max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => {
            info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Model registry is validated before serving anything
    let registry = match load_registry(&config) {
        Ok(registry) => registry,
        Err(e) => {
            error!("Invalid model registry: {:#}", e);
            std::process::exit(1);
        }
    };

    let state = match AppState::new(config.clone(), registry) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to build HTTP clients: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting MaaS gateway on port {}", config.server.port);

    let server_config = config.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::JsonConfig::default().limit(server_config.server.max_json_payload_size))
            .wrap(cors(&server_config))
            .wrap(Logger::default())
            .service(api::config())
            .default_service(web::route().to(not_found))
    })
    .bind(format!("{}:{}", config.server.host, config.server.port))?;

    info!(
        "Server started successfully at http://{}:{}",
        config.server.host, config.server.port
    );

    server.workers(config.server.workers).run().await
}
