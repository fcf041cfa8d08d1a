use async_trait::async_trait;
use serde_json::{json, Value};

use super::{accept_creation, fetch_status, PollOutcome, TaskAdapter};
use crate::error::{GatewayError, Result};
use crate::models::{GenerationRequest, Provider};
use crate::services::normalizer::normalize_video;
use crate::services::GatewayClient;
use crate::utils::{join_segments, provider_base, string_at};

/// Kling video tasks; image-to-video when the request carries an image.
#[derive(Debug, Default, Clone, Copy)]
pub struct KlAdapter;

impl KlAdapter {
    fn mode(request: &GenerationRequest) -> &'static str {
        if request.image.is_some() {
            "image2video"
        } else {
            "text2video"
        }
    }

    fn mode_url(client: &GatewayClient, request: &GenerationRequest) -> String {
        format!(
            "{}/v1/videos/{}",
            provider_base(&client.credentials().endpoint, "", &request.provider_path),
            Self::mode(request)
        )
    }
}

fn interpret(body: &Value, prompt: Option<&str>) -> Result<PollOutcome> {
    let status = string_at(body, "/data/task_status")
        .ok_or_else(|| GatewayError::PollTransient(format!("no task_status in {}", body)))?;

    match status.as_str() {
        "succeed" => match string_at(body, "/data/task_result/videos/0/url") {
            Some(url) => Ok(PollOutcome::Succeeded(normalize_video(&url, prompt))),
            None => Ok(PollOutcome::Failed(
                "task reported success without videos".to_string(),
            )),
        },
        "failed" => Ok(PollOutcome::Failed(
            string_at(body, "/data/task_status_msg").unwrap_or_else(|| "unknown error".to_string()),
        )),
        _ => Ok(PollOutcome::Running { status }),
    }
}

#[async_trait]
impl TaskAdapter for KlAdapter {
    fn provider(&self) -> Provider {
        Provider::Kl
    }

    async fn create(&self, client: &GatewayClient, request: &GenerationRequest) -> Result<String> {
        let mut body = json!({ "model_name": request.model });
        if let Some(prompt) = &request.prompt {
            body["prompt"] = json!(prompt);
        }
        if let Some(image) = &request.image {
            body["image"] = json!(image);
        }
        let reply = accept_creation(client.post_json(&Self::mode_url(client, request), &body).await?)?;
        string_at(&reply, "/data/task_id").ok_or(GatewayError::TaskIdMissing { body: reply })
    }

    async fn poll(
        &self,
        client: &GatewayClient,
        request: &GenerationRequest,
        task_id: &str,
    ) -> Result<PollOutcome> {
        let url = join_segments(&Self::mode_url(client, request), &[task_id])?;
        let body = fetch_status(client, &url).await?;
        interpret(&body, request.prompt.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("submitted")]
    #[case("processing")]
    #[case("SUCCEED")]
    fn other_statuses_keep_running(#[case] status: &str) {
        let body = json!({"data": {"task_status": status}});
        assert!(matches!(
            interpret(&body, None).unwrap(),
            PollOutcome::Running { .. }
        ));
    }

    #[test]
    fn success_with_empty_videos_is_an_error() {
        let body = json!({"data": {"task_status": "succeed", "task_result": {"videos": []}}});
        assert!(matches!(interpret(&body, None).unwrap(), PollOutcome::Failed(_)));
    }

    #[test]
    fn first_video_is_used() {
        let body = json!({"data": {"task_status": "succeed", "task_result": {"videos": [
            {"url": "http://x/v2.mp4"}, {"url": "http://x/other.mp4"}
        ]}}});
        match interpret(&body, Some("waves")).unwrap() {
            PollOutcome::Succeeded(assets) => {
                assert_eq!(assets.len(), 1);
                assert_eq!(assets[0].url, "http://x/v2.mp4");
                assert_eq!(assets[0].revised_prompt, "waves");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn mode_follows_image_presence() {
        let mut request = GenerationRequest::default();
        assert_eq!(KlAdapter::mode(&request), "text2video");
        request.image = Some("data:image/png;base64,AAA".to_string());
        assert_eq!(KlAdapter::mode(&request), "image2video");
    }
}
