use crate::handlers;
use actix_web::{web, Scope};

pub fn config() -> Scope {
    web::scope("/api")
        .route("/health", web::get().to(handlers::health_check))
        .route("/chat/completions", web::post().to(handlers::chat_completions))
        .route("/models", web::get().to(handlers::list_models))
        .route("/models/config", web::get().to(handlers::models_config))
        .route(
            "/images/generations",
            web::post().to(handlers::images_generations),
        )
        .route("/images/mj", web::post().to(handlers::mj_generate))
        .route("/videos/hl", web::post().to(handlers::hl_generate))
        .route("/videos/kl", web::post().to(handlers::kl_generate))
        .route("/endpoints", web::get().to(handlers::endpoints))
        .route("/hl-endpoints", web::get().to(handlers::hl_endpoints))
}
