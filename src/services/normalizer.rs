//! Maps provider success payloads onto [`GeneratedAsset`]s.

use serde_json::Value;

use crate::models::GeneratedAsset;

/// Caption used for videos submitted without a prompt.
pub const DEFAULT_VIDEO_PROMPT: &str = "视频生成";

/// One asset per MJ result URL, captioned with the provider's echoed text
/// when present, else the submitted prompt.
pub fn normalize_mj(urls: &[Value], text: Option<&str>, prompt: Option<&str>) -> Vec<GeneratedAsset> {
    let revised_prompt = text
        .filter(|t| !t.is_empty())
        .or(prompt)
        .unwrap_or_default()
        .to_string();
    urls.iter()
        .filter_map(Value::as_str)
        .filter(|url| !url.trim().is_empty())
        .map(|url| GeneratedAsset {
            url: url.to_string(),
            revised_prompt: revised_prompt.clone(),
        })
        .collect()
}

pub fn normalize_video(url: &str, prompt: Option<&str>) -> Vec<GeneratedAsset> {
    vec![GeneratedAsset {
        url: url.to_string(),
        revised_prompt: prompt.unwrap_or(DEFAULT_VIDEO_PROMPT).to_string(),
    }]
}
