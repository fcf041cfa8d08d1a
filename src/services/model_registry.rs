//! Explicit model → provider/capability table.
//!
//! Rules are matched in order by case-insensitive substring. The table is
//! validated once at startup, so request handling never has to guess.

use anyhow::{bail, Context};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::models::{Capability, ModelConfig, ModelKind, ModelRule, ProviderFamily};

const CHAT_ENDPOINT: &str = "/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    rules: Vec<ModelRule>,
    chat_default: ModelRule,
}

fn rule(
    pattern: &str,
    provider: ProviderFamily,
    kind: ModelKind,
    endpoint: &str,
    capabilities: &[Capability],
) -> ModelRule {
    ModelRule {
        pattern: pattern.to_string(),
        provider,
        kind,
        endpoint: endpoint.to_string(),
        capabilities: capabilities.to_vec(),
    }
}

pub fn default_rules() -> Vec<ModelRule> {
    use Capability::*;
    use ModelKind::*;
    use ProviderFamily::*;

    vec![
        rule("i2v", Hl, Video, "/hailuo/video/generate", &[ImageToVideo]),
        rule("t2v", Hl, Video, "/hailuo/video/generate", &[TextToVideo]),
        rule("hl_video", Hl, Video, "/hailuo/video/generate", &[TextToVideo]),
        rule("hailuo", Hl, Video, "/hailuo/video/generate", &[TextToVideo]),
        rule("kling", Kl, Video, "/v1/videos/text2video", &[TextToVideo, ImageToVideo]),
        rule("haiper", Haiper, Video, "/haiper/video/generate", &[TextToVideo, ImageToVideo]),
        rule("video", Openai, Video, "/v1/videos/generations", &[TextToVideo]),
        rule("mj", Mj, Image, "/tob/diffusion", &[TextToImage]),
        rule("midjourney", Mj, Image, "/tob/diffusion", &[TextToImage]),
        rule("dall-e", Openai, Image, "/v1/images/generations", &[TextToImage]),
        rule("flux", Openai, Image, "/v1/images/generations", &[TextToImage]),
        rule("image", Openai, Image, "/v1/images/generations", &[TextToImage]),
    ]
}

impl ModelRegistry {
    /// Builds a registry, rejecting tables that would misroute requests.
    pub fn new(rules: Vec<ModelRule>) -> anyhow::Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            let pattern = rule.pattern.trim().to_lowercase();
            if pattern.is_empty() {
                bail!("model registry rule with empty pattern");
            }
            if !seen.insert(pattern) {
                bail!("duplicate model registry pattern: {}", rule.pattern);
            }
            if rule.endpoint.trim().is_empty() {
                bail!("model registry rule {} has no endpoint", rule.pattern);
            }
            let generates = rule.capabilities.iter().any(|c| *c != Capability::Chat);
            if rule.kind.is_media() && !generates {
                bail!(
                    "media model rule {} declares no generation capability",
                    rule.pattern
                );
            }
        }

        Ok(Self {
            rules,
            chat_default: ModelRule {
                pattern: String::new(),
                provider: ProviderFamily::Openai,
                kind: ModelKind::Chat,
                endpoint: CHAT_ENDPOINT.to_string(),
                capabilities: vec![Capability::Chat],
            },
        })
    }

    pub fn with_defaults() -> anyhow::Result<Self> {
        Self::new(default_rules())
    }

    /// Loads rules from a JSON array file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model registry: {}", path.display()))?;
        let rules: Vec<ModelRule> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid model registry JSON: {}", path.display()))?;
        Self::new(rules)
    }

    pub fn resolve(&self, model_id: &str) -> &ModelRule {
        let model_id = model_id.to_lowercase();
        self.rules
            .iter()
            .find(|rule| model_id.contains(&rule.pattern.trim().to_lowercase()))
            .unwrap_or(&self.chat_default)
    }

    /// Whether a model is worth a per-model detail probe.
    pub fn is_media(&self, model_id: &str) -> bool {
        self.resolve(model_id).kind.is_media()
    }

    /// The whole table keyed by pattern, served when nothing can be detected.
    pub fn static_configs(&self) -> BTreeMap<String, ModelConfig> {
        self.rules
            .iter()
            .map(|rule| {
                let config = ModelConfig {
                    endpoint: rule.endpoint.clone(),
                    kind: rule.kind,
                    real_model_id: None,
                };
                (rule.pattern.clone(), config)
            })
            .collect()
    }

    /// Static config used whenever detection is unavailable.
    pub fn static_config(&self, model_id: &str) -> ModelConfig {
        let rule = self.resolve(model_id);
        ModelConfig {
            endpoint: rule.endpoint.clone(),
            kind: rule.kind,
            real_model_id: None,
        }
    }
}
