use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MjImageRequest {
    #[validate(length(min = 1, max = 8000))]
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VideoRequest {
    #[validate(length(min = 1, max = 256))]
    pub model: String,
    #[validate(length(min = 1, max = 8000))]
    pub prompt: Option<String>,
    /// Image URL or base64 data URI.
    pub image: Option<String>,
    pub audio: Option<String>,
}

/// Provider-agnostic generation input handed to a task adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    pub prompt: Option<String>,
    pub image: Option<String>,
    pub audio: Option<String>,
    pub model: String,
    /// Account-specific routing segment, or a full base URL.
    pub provider_path: String,
}

impl GenerationRequest {
    pub fn from_mj(req: MjImageRequest, provider_path: String) -> Self {
        Self {
            prompt: Some(req.prompt),
            provider_path,
            ..Default::default()
        }
    }

    pub fn from_video(req: VideoRequest, provider_path: String) -> Self {
        Self {
            prompt: non_empty(req.prompt),
            image: non_empty(req.image),
            audio: non_empty(req.audio),
            model: req.model,
            provider_path,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_video_fields_are_dropped() {
        let req = VideoRequest {
            model: "kling-v1".to_string(),
            prompt: Some("a dog".to_string()),
            image: Some("   ".to_string()),
            audio: None,
        };
        let generation = GenerationRequest::from_video(req, "kling".to_string());
        assert_eq!(generation.prompt.as_deref(), Some("a dog"));
        assert!(generation.image.is_none());
        assert_eq!(generation.provider_path, "kling");
    }

    #[test]
    fn empty_prompt_fails_validation() {
        let req = MjImageRequest {
            prompt: String::new(),
        };
        assert!(req.validate().is_err());
    }
}
