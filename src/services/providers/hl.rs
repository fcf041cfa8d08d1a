use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{accept_creation, fetch_status, PollOutcome, TaskAdapter};
use crate::error::{upstream_message, GatewayError, Result};
use crate::models::{GenerationRequest, Provider};
use crate::services::normalizer::normalize_video;
use crate::services::GatewayClient;
use crate::utils::{first_string_at, provider_base, string_at, with_query};

/// Ordered guesses for where the task id hides in a creation reply.
#[cfg(feature = "lenient-task-id")]
const TASK_ID_CANDIDATES: &[&str] = &[
    "/taskId",
    "/task_id",
    "/id",
    "/requestId",
    "/data/taskId",
    "/data/task_id",
    "/data/id",
    "/data/requestId",
    "/result/taskId",
    "/result/task_id",
    "/result/id",
    "/result/requestId",
];

const MEDIA_URL_FIELDS: &[&str] = &[
    "/mediaUrl",
    "/media_url",
    "/data/mediaUrl",
    "/file/download_url",
];

#[derive(Debug, Deserialize)]
struct CreateReply {
    #[serde(rename = "taskId", alias = "task_id")]
    task_id: Option<Value>,
}

/// Hailuo video tasks.
#[derive(Debug, Default, Clone, Copy)]
pub struct HlAdapter;

impl HlAdapter {
    fn base(client: &GatewayClient, request: &GenerationRequest) -> String {
        provider_base(&client.credentials().endpoint, "v1/ai", &request.provider_path)
    }

    async fn resolve_file(
        client: &GatewayClient,
        base: &str,
        file_id: &str,
        prompt: Option<&str>,
    ) -> Result<PollOutcome> {
        let url = with_query(&format!("{}/hailuo/file/retrieve", base), "fileId", file_id)?;
        let reply = client
            .get_json(&url, None)
            .await
            .map_err(|e| GatewayError::PollTransient(e.to_string()))?;
        if !reply.is_success() {
            return Err(GatewayError::FileResolution {
                status: reply.status.as_u16(),
                body: reply.body,
            });
        }
        match first_string_at(&reply.body, MEDIA_URL_FIELDS) {
            Some(media_url) => Ok(PollOutcome::Succeeded(normalize_video(&media_url, prompt))),
            None => Err(GatewayError::FileResolution {
                status: reply.status.as_u16(),
                body: reply.body,
            }),
        }
    }
}

pub(crate) fn extract_task_id(body: &Value) -> Option<String> {
    let typed = serde_json::from_value::<CreateReply>(body.clone())
        .ok()
        .and_then(|reply| reply.task_id)
        .and_then(|id| string_at(&id, ""));
    #[cfg(feature = "lenient-task-id")]
    let typed = typed.or_else(|| first_string_at(body, TASK_ID_CANDIDATES));
    typed
}

#[derive(Debug, PartialEq)]
enum Status {
    Done(PollOutcome),
    NeedsFile(String),
}

/// `error` only ends the task when it carries something to report.
fn meaningful_error(body: &Value) -> Option<&Value> {
    body.get("error").filter(|error| match error {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

fn interpret(body: &Value) -> Result<Status> {
    if let Some(error) = meaningful_error(body) {
        return Ok(Status::Done(PollOutcome::Failed(upstream_message(
            &json!({ "error": error }),
        ))));
    }

    let status = body
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_uppercase)
        .ok_or_else(|| GatewayError::PollTransient(format!("no status in {}", body)))?;

    match status.as_str() {
        "SUCCESS" => match first_string_at(body, &["/fileId", "/file_id"]) {
            Some(file_id) => Ok(Status::NeedsFile(file_id)),
            None => Ok(Status::Done(PollOutcome::Failed(
                "task reported success without a file id".to_string(),
            ))),
        },
        "FAIL" => Ok(Status::Done(PollOutcome::Failed(
            first_string_at(body, &["/failReason", "/message"])
                .unwrap_or_else(|| "unknown error".to_string()),
        ))),
        _ => Ok(Status::Done(PollOutcome::Running { status })),
    }
}

#[async_trait]
impl TaskAdapter for HlAdapter {
    fn provider(&self) -> Provider {
        Provider::Hl
    }

    async fn create(&self, client: &GatewayClient, request: &GenerationRequest) -> Result<String> {
        let url = format!("{}/hailuo/video/generate", Self::base(client, request));
        let mut body = json!({
            "model": request.model,
            "promptOptimizer": true,
            "prompt": request.prompt.as_deref().unwrap_or_default(),
        });
        if let Some(image) = &request.image {
            body["firstFrameImage"] = json!(image);
        }
        let reply = accept_creation(client.post_json(&url, &body).await?)?;
        extract_task_id(&reply).ok_or(GatewayError::TaskIdMissing { body: reply })
    }

    async fn poll(
        &self,
        client: &GatewayClient,
        request: &GenerationRequest,
        task_id: &str,
    ) -> Result<PollOutcome> {
        let base = Self::base(client, request);
        let url = with_query(&format!("{}/hailuo/video/query", base), "taskId", task_id)?;
        let body = fetch_status(client, &url).await?;
        match interpret(&body)? {
            Status::Done(outcome) => Ok(outcome),
            Status::NeedsFile(file_id) => {
                Self::resolve_file(client, &base, &file_id, request.prompt.as_deref()).await
            }
        }
    }
}
