//! Task submission adapters, one per provider family.
//!
//! An adapter knows how to create a task upstream and how to read a single
//! status reply. Looping, sleeping and budgets belong to the
//! [`PollingOrchestrator`](crate::services::PollingOrchestrator).

pub mod hl;
pub mod kl;
pub mod mj;

pub use hl::HlAdapter;
pub use kl::KlAdapter;
pub use mj::MjAdapter;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::models::{GeneratedAsset, GenerationRequest, Provider};
use crate::services::{GatewayClient, UpstreamReply};

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Not finished; `status` is the raw provider value, for logging.
    Running { status: String },
    Succeeded(Vec<GeneratedAsset>),
    Failed(String),
}

#[async_trait]
pub trait TaskAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    /// Submits the task once and returns its id.
    async fn create(&self, client: &GatewayClient, request: &GenerationRequest) -> Result<String>;

    /// Performs one status check. Errors that should not end the task are
    /// reported as [`GatewayError::PollTransient`].
    async fn poll(
        &self,
        client: &GatewayClient,
        request: &GenerationRequest,
        task_id: &str,
    ) -> Result<PollOutcome>;
}

/// Shared creation-reply check: non-2xx becomes `TaskCreation`.
pub(crate) fn accept_creation(reply: UpstreamReply) -> Result<Value> {
    if !reply.is_success() {
        return Err(GatewayError::TaskCreation {
            status: reply.status.as_u16(),
            body: reply.body,
        });
    }
    Ok(reply.body)
}

/// Fetches a status document, folding every failure into `PollTransient`.
pub(crate) async fn fetch_status(client: &GatewayClient, url: &str) -> Result<Value> {
    let reply = client
        .get_json(url, None)
        .await
        .map_err(|e| GatewayError::PollTransient(e.to_string()))?;
    if !reply.is_success() {
        return Err(GatewayError::PollTransient(format!(
            "status check returned {}: {}",
            reply.status, reply.body
        )));
    }
    if !reply.body.is_object() {
        return Err(GatewayError::PollTransient(format!(
            "malformed status body: {}",
            reply.body
        )));
    }
    Ok(reply.body)
}
