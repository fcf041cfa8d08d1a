use async_trait::async_trait;
use serde_json::{json, Value};

use super::{accept_creation, fetch_status, PollOutcome, TaskAdapter};
use crate::error::{GatewayError, Result};
use crate::models::{GenerationRequest, Provider};
use crate::services::normalizer::normalize_mj;
use crate::services::GatewayClient;
use crate::utils::{join_segments, provider_base, string_at};

const STATUS_SUCCEEDED: i64 = 2;
const STATUS_FAILED: i64 = 3;

/// Midjourney-style image tasks.
#[derive(Debug, Default, Clone, Copy)]
pub struct MjAdapter;

impl MjAdapter {
    fn base(client: &GatewayClient, request: &GenerationRequest) -> String {
        provider_base(&client.credentials().endpoint, "", &request.provider_path)
    }
}

#[async_trait]
impl TaskAdapter for MjAdapter {
    fn provider(&self) -> Provider {
        Provider::Mj
    }

    async fn create(&self, client: &GatewayClient, request: &GenerationRequest) -> Result<String> {
        let url = format!("{}/tob/diffusion", Self::base(client, request));
        let body = json!({ "text": request.prompt.as_deref().unwrap_or_default() });
        let reply = accept_creation(client.post_json(&url, &body).await?)?;
        string_at(&reply, "/id").ok_or(GatewayError::TaskIdMissing { body: reply })
    }

    async fn poll(
        &self,
        client: &GatewayClient,
        request: &GenerationRequest,
        task_id: &str,
    ) -> Result<PollOutcome> {
        let url = join_segments(&format!("{}/tob/job", Self::base(client, request)), &[task_id])?;
        let body = fetch_status(client, &url).await?;
        interpret(&body, request.prompt.as_deref())
    }
}

fn interpret(body: &Value, prompt: Option<&str>) -> Result<PollOutcome> {
    let status = match body.get("status") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| GatewayError::PollTransient(format!("no numeric status in {}", body)))?;

    match status {
        STATUS_SUCCEEDED => {
            let urls = body
                .get("urls")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let assets = normalize_mj(urls, body.get("text").and_then(Value::as_str), prompt);
            if assets.is_empty() {
                return Ok(PollOutcome::Failed(
                    "task reported success without image urls".to_string(),
                ));
            }
            Ok(PollOutcome::Succeeded(assets))
        }
        STATUS_FAILED => Ok(PollOutcome::Failed(
            string_at(body, "/comment").unwrap_or_else(|| "unknown error".to_string()),
        )),
        other => Ok(PollOutcome::Running {
            status: other.to_string(),
        }),
    }
}
