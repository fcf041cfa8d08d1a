use serde_json::Value;

use crate::error::upstream_message;
use crate::models::ClassifiedErrorResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageErrorKind {
    ContentPolicyViolation,
    QuotaExceeded,
    RateLimitExceeded,
    AuthenticationFailed,
    InvalidRequest,
    ServerError,
    ApiError,
}

impl ImageErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageErrorKind::ContentPolicyViolation => "content_policy_violation",
            ImageErrorKind::QuotaExceeded => "quota_exceeded",
            ImageErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ImageErrorKind::AuthenticationFailed => "authentication_failed",
            ImageErrorKind::InvalidRequest => "invalid_request",
            ImageErrorKind::ServerError => "server_error",
            ImageErrorKind::ApiError => "api_error",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ImageErrorKind::ContentPolicyViolation => "图片描述包含不当内容，已被安全系统拦截",
            ImageErrorKind::QuotaExceeded => "API 配额已用完，请检查账户余额",
            ImageErrorKind::RateLimitExceeded => "请求过于频繁，请稍后再试",
            ImageErrorKind::AuthenticationFailed => "API 密钥无效或已过期，请检查配置",
            ImageErrorKind::InvalidRequest => "请求参数有误，请检查图片尺寸、数量等设置",
            ImageErrorKind::ServerError => "图片生成服务暂时不可用，请稍后重试",
            ImageErrorKind::ApiError => "图片生成失败",
        }
    }

    fn suggestions(&self) -> Option<Vec<String>> {
        match self {
            ImageErrorKind::ContentPolicyViolation => Some(
                [
                    "避免描述暴力、色情或其他敏感内容",
                    "尝试使用更中性、描述性的词语",
                    "避免提及真实人物或受版权保护的角色",
                    "换一种方式表达你想要的画面",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ),
            _ => None,
        }
    }
}

const CONTENT_POLICY: &[&str] = &[
    "content_policy",
    "content policy",
    "safety system",
    "moderation",
    "inappropriate",
    "unsafe",
    "敏感",
    "违规",
];
const QUOTA: &[&str] = &["quota", "insufficient", "balance", "billing", "余额", "额度"];
const RATE_LIMIT: &[&str] = &["rate limit", "rate_limit", "too many requests"];
const AUTH: &[&str] = &[
    "invalid_api_key",
    "invalid api key",
    "unauthorized",
    "authentication",
    "incorrect api key",
];
const INVALID: &[&str] = &["invalid_request", "invalid", "parameter", "bad request"];
const SERVER: &[&str] = &["server_error", "internal error", "service unavailable"];

/// Buckets an upstream failure by status and by substrings of its
/// message, code and type.
pub fn classify(status: u16, body: &Value) -> ImageErrorKind {
    let haystack = [
        Some(upstream_message(body)),
        body.pointer("/error/code").map(Value::to_string),
        body.pointer("/error/type").map(Value::to_string),
        body.get("code").map(Value::to_string),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| haystack.contains(n));

    if has(CONTENT_POLICY) {
        ImageErrorKind::ContentPolicyViolation
    } else if has(QUOTA) {
        ImageErrorKind::QuotaExceeded
    } else if status == 429 || has(RATE_LIMIT) {
        ImageErrorKind::RateLimitExceeded
    } else if status == 401 || status == 403 || has(AUTH) {
        ImageErrorKind::AuthenticationFailed
    } else if status == 400 || has(INVALID) {
        ImageErrorKind::InvalidRequest
    } else if status >= 500 || has(SERVER) {
        ImageErrorKind::ServerError
    } else {
        ImageErrorKind::ApiError
    }
}

pub fn classified_response(status: u16, body: &Value) -> ClassifiedErrorResponse {
    let kind = classify(status, body);
    ClassifiedErrorResponse {
        error: upstream_message(body),
        message: kind.message().to_string(),
        kind: kind.as_str().to_string(),
        suggestions: kind.suggestions(),
    }
}
