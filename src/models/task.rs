use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream generation backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Mj,
    Hl,
    Kl,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Mj => "mj",
            Provider::Hl => "hl",
            Provider::Kl => "kl",
        }
    }
}

/// Task lifecycle. Variants are declared in transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum TaskState {
    Pending,
    Processing,
    Succeeded,
    Failed,
    TimedOut,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::TimedOut
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAsset {
    pub url: String,
    pub revised_prompt: String,
}

/// Canonical body returned for every finished generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub created: i64,
    pub data: Vec<GeneratedAsset>,
}

impl GenerationResult {
    pub fn new(data: Vec<GeneratedAsset>) -> Self {
        Self {
            created: Utc::now().timestamp(),
            data,
        }
    }
}

/// A task created on an upstream provider, owned by the polling loop for
/// the lifetime of one request.
#[derive(Debug, Clone)]
pub struct GenerationTask {
    pub task_id: String,
    pub provider: Provider,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
    pub attempts: u32,
    pub transient_failures: u32,
    pub artifact: Option<Vec<GeneratedAsset>>,
    pub failure_reason: Option<String>,
}

impl GenerationTask {
    pub fn new(task_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            task_id: task_id.into(),
            provider,
            state: TaskState::Pending,
            created_at: Utc::now(),
            attempts: 0,
            transient_failures: 0,
            artifact: None,
            failure_reason: None,
        }
    }

    /// Moves the task forward. Backward moves and moves out of a terminal
    /// state are ignored; returns whether the state changed.
    pub fn advance(&mut self, next: TaskState) -> bool {
        if self.state.is_terminal() || next <= self.state {
            return false;
        }
        self.state = next;
        true
    }

    pub fn succeed(&mut self, assets: Vec<GeneratedAsset>) {
        if self.advance(TaskState::Succeeded) {
            self.artifact = Some(assets);
        }
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.advance(TaskState::Failed) {
            self.failure_reason = Some(reason.into());
        }
    }

    pub fn time_out(&mut self) {
        if self.advance(TaskState::TimedOut) {
            self.failure_reason = Some(format!(
                "no terminal status after {} attempts",
                self.attempts
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_only_moves_forward() {
        let mut task = GenerationTask::new("abc", Provider::Mj);
        assert!(task.advance(TaskState::Processing));
        assert!(!task.advance(TaskState::Pending));
        assert_eq!(task.state, TaskState::Processing);

        task.succeed(vec![GeneratedAsset {
            url: "http://x/1.png".to_string(),
            revised_prompt: "a cat".to_string(),
        }]);
        assert_eq!(task.state, TaskState::Succeeded);

        task.fail("late failure");
        assert_eq!(task.state, TaskState::Succeeded);
        assert!(task.failure_reason.is_none());
    }

    #[test]
    fn timed_out_records_reason() {
        let mut task = GenerationTask::new("t1", Provider::Hl);
        task.attempts = 120;
        task.time_out();
        assert_eq!(task.state, TaskState::TimedOut);
        assert!(task.failure_reason.unwrap().contains("120"));
        assert!(task.artifact.is_none());
    }
}
