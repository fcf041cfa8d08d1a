use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::Value;
use thiserror::Error;

use crate::models::ErrorResponse;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("task creation failed ({status}): {body}")]
    TaskCreation { status: u16, body: Value },

    #[error("task id missing from creation response: {body}")]
    TaskIdMissing { body: Value },

    /// Absorbed by the polling loop; never reaches a client.
    #[error("transient poll failure: {0}")]
    PollTransient(String),

    #[error("task failed: {reason}")]
    TaskFailed { reason: String },

    #[error("task timed out after {attempts} status checks")]
    TaskTimedOut { attempts: u32 },

    #[error("file resolution failed ({status}): {body}")]
    FileResolution { status: u16, body: Value },

    /// Absorbed by the model config cache behind its static fallback.
    #[error("model config detection failed: {0}")]
    ConfigDetection(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::PollTransient(_))
    }

    /// Human readable reason, embedding the upstream message where one exists.
    pub fn reason(&self) -> String {
        match self {
            GatewayError::TaskCreation { body, .. } => {
                format!("任务创建失败: {}", upstream_message(body))
            }
            GatewayError::TaskIdMissing { body } => {
                format!("未能从响应中获取任务ID: {}", body)
            }
            GatewayError::TaskFailed { reason } => format!("生成失败: {}", reason),
            GatewayError::TaskTimedOut { .. } => "生成超时，请稍后重试".to_string(),
            GatewayError::FileResolution { body, .. } => {
                format!("获取生成文件失败: {}", upstream_message(body))
            }
            other => other.to_string(),
        }
    }
}

/// Pulls the most specific message out of an upstream error body.
pub fn upstream_message(body: &Value) -> String {
    let candidates = [
        body.pointer("/error/message"),
        body.get("error"),
        body.get("message"),
        body.get("msg"),
        body.pointer("/base_resp/status_msg"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|value| value.as_str().filter(|s| !s.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| match body {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        })
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MissingHeader(_)
            | GatewayError::InvalidRequest(_)
            | GatewayError::UnsupportedModel(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.reason()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upstream_message_prefers_nested_error_message() {
        let body = json!({"error": {"message": "quota used up", "code": "x"}});
        assert_eq!(upstream_message(&body), "quota used up");
    }

    #[test]
    fn upstream_message_falls_back_to_raw_text() {
        assert_eq!(upstream_message(&json!("bad gateway")), "bad gateway");
        assert_eq!(upstream_message(&json!({"code": 7})), r#"{"code":7}"#);
    }

    #[test]
    fn terminal_failures_map_to_server_errors() {
        let err = GatewayError::TaskFailed {
            reason: "unsafe content".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.reason().contains("unsafe content"));
        assert_eq!(
            GatewayError::MissingHeader("X-MJ-Endpoint-Path").status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
