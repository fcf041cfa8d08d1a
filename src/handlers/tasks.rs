use actix_web::{web, HttpResponse};
use tracing::{info_span, Instrument};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::error::GatewayError;
use crate::models::{ErrorResponse, GenerationRequest};
use crate::services::providers::TaskAdapter;
use crate::services::Credentials;
use crate::AppState;

/// Runs a create-and-poll generation inside a span tagged with a fresh
/// request id, answering with the canonical result body.
pub(crate) async fn run_task(
    state: &web::Data<AppState>,
    adapter: &dyn TaskAdapter,
    credentials: Credentials,
    request: GenerationRequest,
) -> Result<HttpResponse, GatewayError> {
    let request_id = Uuid::new_v4();
    let span = info_span!(
        "generation",
        %request_id,
        provider = adapter.provider().as_str(),
        model = %request.model,
        has_image = request.image.is_some(),
        has_audio = request.audio.is_some()
    );

    let result = state
        .generation
        .generate(adapter, credentials, &request)
        .instrument(span)
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

pub(crate) fn invalid(errors: ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::with_details(
        "Invalid request",
        format!("Validation error: {}", errors),
    ))
}
