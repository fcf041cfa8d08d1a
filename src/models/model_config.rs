use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Chat,
    Image,
    Video,
}

impl ModelKind {
    pub fn is_media(&self) -> bool {
        !matches!(self, ModelKind::Chat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFamily {
    Openai,
    Mj,
    Hl,
    Kl,
    Haiper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Chat,
    TextToImage,
    TextToVideo,
    ImageToVideo,
}

/// One entry of the model registry, matched by case-insensitive substring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRule {
    pub pattern: String,
    pub provider: ProviderFamily,
    pub kind: ModelKind,
    pub endpoint: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub endpoint: String,
    #[serde(rename = "type")]
    pub kind: ModelKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_model_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    ConfigApi,
    ModelProbe,
    Static,
}

/// Result of one model config detection. Kept in a `BTreeMap` so repeated
/// serialization of the same entry is byte-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfigEntry {
    pub model_configs: BTreeMap<String, ModelConfig>,
    pub detection_method: DetectionMethod,
    pub timestamp: DateTime<Utc>,
}
