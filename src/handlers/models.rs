use actix_web::{web, HttpResponse};
use reqwest::Method;

use crate::error::GatewayError;
use crate::handlers::chat::relay;
use crate::middleware::GatewayAuth;
use crate::services::GatewayClient;
use crate::AppState;

pub async fn list_models(
    state: web::Data<AppState>,
    GatewayAuth(credentials): GatewayAuth,
) -> Result<HttpResponse, GatewayError> {
    let upstream = GatewayClient::new(state.http.clone(), credentials)
        .forward(Method::GET, "/v1/models", None)
        .await?;
    relay(upstream, false).await
}

/// Detected model → endpoint mapping. Never fails on detection problems;
/// those degrade to the static table inside the cache.
pub async fn models_config(
    state: web::Data<AppState>,
    GatewayAuth(credentials): GatewayAuth,
) -> Result<HttpResponse, GatewayError> {
    let entry = state.model_configs.get(&credentials).await;
    Ok(HttpResponse::Ok().json(entry))
}
