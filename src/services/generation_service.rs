use reqwest::Client;
use tracing::info;

use crate::config::PollingConfig;
use crate::error::Result;
use crate::models::{GenerationRequest, GenerationResult, GenerationTask};
use crate::services::providers::TaskAdapter;
use crate::services::{Credentials, GatewayClient, PollPolicy, PollingOrchestrator};

/// Create-then-poll flow shared by every asynchronous generation route.
#[derive(Clone)]
pub struct GenerationService {
    http: Client,
    polling: PollingConfig,
}

impl GenerationService {
    pub fn new(http: Client, polling: PollingConfig) -> Self {
        Self { http, polling }
    }

    pub async fn generate(
        &self,
        adapter: &dyn TaskAdapter,
        credentials: Credentials,
        request: &GenerationRequest,
    ) -> Result<GenerationResult> {
        let provider = adapter.provider();
        let client = GatewayClient::new(self.http.clone(), credentials);

        let task_id = adapter.create(&client, request).await?;
        info!(provider = provider.as_str(), task_id = %task_id, "task created");

        let orchestrator =
            PollingOrchestrator::new(PollPolicy::for_provider(&self.polling, provider));
        let task = orchestrator
            .drive(adapter, &client, request, GenerationTask::new(task_id, provider))
            .await?;

        Ok(GenerationResult::new(task.artifact.unwrap_or_default()))
    }
}
