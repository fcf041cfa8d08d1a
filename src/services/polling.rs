use chrono::Utc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::PollingConfig;
use crate::error::{GatewayError, Result};
use crate::models::{GenerationRequest, GenerationTask, Provider, TaskState};
use crate::services::providers::{PollOutcome, TaskAdapter};
use crate::services::GatewayClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn for_provider(config: &PollingConfig, provider: Provider) -> Self {
        let max_attempts = match provider {
            Provider::Mj => config.mj_max_attempts,
            Provider::Hl => config.hl_max_attempts,
            Provider::Kl => config.kl_max_attempts,
        };
        Self {
            interval: config.interval(),
            max_attempts,
        }
    }
}

/// Drives a created task to a terminal state: sleep, check once, repeat,
/// until the provider reports an outcome or the attempt budget runs out.
///
/// Transient check failures are logged and skipped. They still consume an
/// attempt, so the budget bounds the number of upstream calls.
#[derive(Debug, Clone, Copy)]
pub struct PollingOrchestrator {
    policy: PollPolicy,
}

impl PollingOrchestrator {
    pub fn new(policy: PollPolicy) -> Self {
        Self { policy }
    }

    /// Returns the succeeded task, or the terminal error that ended it.
    pub async fn drive(
        &self,
        adapter: &dyn TaskAdapter,
        client: &GatewayClient,
        request: &GenerationRequest,
        mut task: GenerationTask,
    ) -> Result<GenerationTask> {
        let provider = task.provider.as_str();

        while task.attempts < self.policy.max_attempts {
            sleep(self.policy.interval).await;
            task.attempts += 1;

            match adapter.poll(client, request, &task.task_id).await {
                Ok(PollOutcome::Running { status }) => {
                    task.advance(TaskState::Processing);
                    debug!(
                        provider,
                        task_id = %task.task_id,
                        attempt = task.attempts,
                        status = %status,
                        "task still running"
                    );
                }
                Ok(PollOutcome::Succeeded(assets)) => {
                    info!(
                        provider,
                        task_id = %task.task_id,
                        attempts = task.attempts,
                        transient_failures = task.transient_failures,
                        assets = assets.len(),
                        elapsed_ms = (Utc::now() - task.created_at).num_milliseconds(),
                        "task succeeded"
                    );
                    task.succeed(assets);
                    return Ok(task);
                }
                Ok(PollOutcome::Failed(reason)) => {
                    warn!(
                        provider,
                        task_id = %task.task_id,
                        attempts = task.attempts,
                        reason = %reason,
                        "task failed upstream"
                    );
                    task.fail(reason.clone());
                    return Err(GatewayError::TaskFailed { reason });
                }
                Err(e) if e.is_transient() => {
                    task.transient_failures += 1;
                    warn!(
                        provider,
                        task_id = %task.task_id,
                        attempt = task.attempts,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "status check failed, retrying"
                    );
                }
                Err(e) => {
                    error!(
                        provider,
                        task_id = %task.task_id,
                        attempts = task.attempts,
                        error = %e,
                        "task aborted"
                    );
                    task.fail(e.to_string());
                    return Err(e);
                }
            }
        }

        task.time_out();
        error!(
            provider,
            task_id = %task.task_id,
            attempts = task.attempts,
            transient_failures = task.transient_failures,
            elapsed_ms = (Utc::now() - task.created_at).num_milliseconds(),
            reason = task.failure_reason.as_deref().unwrap_or_default(),
            "task timed out"
        );
        Err(GatewayError::TaskTimedOut {
            attempts: task.attempts,
        })
    }
}
