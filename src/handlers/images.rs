use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use reqwest::Method;
use serde_json::Value;
use validator::Validate;

use crate::error::GatewayError;
use crate::handlers::tasks::{invalid, run_task};
use crate::middleware::{required_header, GatewayAuth, MJ_PATH_HEADER};
use crate::models::{GenerationRequest, MjImageRequest};
use crate::services::error_classifier::classified_response;
use crate::services::providers::MjAdapter;
use crate::services::GatewayClient;
use crate::AppState;

/// Synchronous image generation, with failures reclassified for the UI.
pub async fn images_generations(
    state: web::Data<AppState>,
    GatewayAuth(credentials): GatewayAuth,
    body: web::Json<Value>,
) -> Result<HttpResponse, GatewayError> {
    let upstream = GatewayClient::new(state.http.clone(), credentials)
        .forward(Method::POST, "/v1/images/generations", Some(&body.0))
        .await?;
    let status = upstream.status().as_u16();
    let text = upstream.text().await?;
    let payload: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

    if (200..300).contains(&status) {
        return Ok(HttpResponse::Ok().json(payload));
    }

    let classified = classified_response(status, &payload);
    tracing::warn!(status, kind = %classified.kind, error = %classified.error, "image generation failed");
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok(HttpResponse::build(status).json(classified))
}

pub async fn mj_generate(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    GatewayAuth(credentials): GatewayAuth,
    req: web::Json<MjImageRequest>,
) -> Result<HttpResponse, GatewayError> {
    if let Err(e) = req.validate() {
        return Ok(invalid(e));
    }
    let mj_path = required_header(&http_req, MJ_PATH_HEADER)?;
    let request = GenerationRequest::from_mj(req.into_inner(), mj_path);
    run_task(&state, &MjAdapter, credentials, request).await
}
