//! Workflow execution start and status polling.

use std::fmt;

use reqwest::Method;
use serde_json::{Map, Value, json};
use tokio::time::{Instant, sleep};
use tracing::info;

use super::client::{ApiCall, ManagerClient};
use super::error::ApiError;
use super::session::SessionToken;
use super::transport::Dispatch;

/// Status reported when the manager omits the `status` field.
const UNKNOWN_STATUS: &str = "unknown";

/// Identifier of a started execution.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ExecutionHandle(String);

impl ExecutionHandle {
    /// Wraps an execution id.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the execution id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an observed execution status is interpreted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusClass {
    /// Terminal and successful.
    Succeeded,
    /// Terminal and unsuccessful.
    Failed,
    /// Anything else, including statuses the vocabulary does not know.
    Running,
}

/// Status strings that end polling.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusVocabulary {
    success: Vec<String>,
    failure: Vec<String>,
}

impl StatusVocabulary {
    /// Builds a vocabulary from explicit success and failure sets.
    #[must_use]
    pub fn new<S, F>(success: S, failure: F) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            success: success.into_iter().map(Into::into).collect(),
            failure: failure.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses comma-separated lists, ignoring blanks and surrounding spaces.
    #[must_use]
    pub fn from_lists(success: &str, failure: &str) -> Self {
        Self::new(split_list(success), split_list(failure))
    }

    /// Statuses treated as successful completion.
    #[must_use]
    pub fn success(&self) -> &[String] {
        &self.success
    }

    /// Statuses treated as failed completion.
    #[must_use]
    pub fn failure(&self) -> &[String] {
        &self.failure
    }

    /// Classifies a status; success wins when a value is in both sets.
    #[must_use]
    pub fn classify(&self, status: &str) -> StatusClass {
        if self.success.iter().any(|known| known == status) {
            StatusClass::Succeeded
        } else if self.failure.iter().any(|known| known == status) {
            StatusClass::Failed
        } else {
            StatusClass::Running
        }
    }
}

impl Default for StatusVocabulary {
    fn default() -> Self {
        Self::new(["terminated"], ["failed", "cancelled"])
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

impl<D: Dispatch> ManagerClient<D> {
    /// Starts `workflow_id` against `deployment_id`.
    ///
    /// Parameters are sent only when present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::StartExecution`] when the manager rejects the
    /// request and [`ApiError::MissingExecutionId`] when a successful response
    /// carries no id.
    pub async fn start_execution(
        &self,
        token: &SessionToken,
        deployment_id: &str,
        workflow_id: &str,
        parameters: Option<&Map<String, Value>>,
    ) -> Result<ExecutionHandle, ApiError> {
        let mut payload = Map::new();
        payload.insert(String::from("deployment_id"), json!(deployment_id));
        payload.insert(String::from("workflow_id"), json!(workflow_id));
        if let Some(params) = parameters.filter(|params| !params.is_empty()) {
            payload.insert(String::from("parameters"), Value::Object(params.clone()));
        }

        info!(deployment_id, workflow_id, "starting workflow");
        let response = self
            .call(
                ApiCall::new(Method::POST, "executions")
                    .token(token)
                    .json(Value::Object(payload)),
            )
            .await?;

        if response.is_error() {
            return Err(ApiError::StartExecution {
                status: response.status,
                body: response.text,
            });
        }

        let Some(execution_id) = response
            .str_field("id")
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
        else {
            return Err(ApiError::MissingExecutionId {
                body: response.text,
            });
        };
        info!(execution_id = %execution_id, "execution started");
        Ok(ExecutionHandle::new(execution_id))
    }

    /// Polls an execution until it reaches a terminal status.
    ///
    /// The deadline is fixed on entry to `now + exec_timeout`; a timeout too
    /// large to represent as an instant never expires. Polls are
    /// spaced by the constant poll interval; transient HTTP failures are
    /// already retried by the transport, so an error status here is final.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ReadExecution`] when a poll is rejected,
    /// [`ApiError::ExecutionFailed`] on a failure-terminal status and
    /// [`ApiError::Timeout`] when the deadline passes first.
    pub async fn await_execution(
        &self,
        token: &SessionToken,
        execution: &ExecutionHandle,
    ) -> Result<(), ApiError> {
        let profile = self.profile();
        let deadline = Instant::now().checked_add(profile.exec_timeout);
        let path = format!("executions/{execution}");

        loop {
            let response = self
                .call(ApiCall::new(Method::GET, path.as_str()).token(token))
                .await?;
            if response.is_error() {
                return Err(ApiError::ReadExecution {
                    execution_id: execution.to_string(),
                    status: response.status,
                    body: response.text,
                });
            }

            let status = response
                .str_field("status")
                .unwrap_or(UNKNOWN_STATUS)
                .to_owned();
            info!(execution_id = %execution, status = %status, "execution status");

            match profile.statuses.classify(&status) {
                StatusClass::Succeeded => {
                    info!(execution_id = %execution, "execution succeeded");
                    return Ok(());
                }
                StatusClass::Failed => {
                    return Err(ApiError::ExecutionFailed {
                        execution_id: execution.to_string(),
                        status,
                        body: response.text,
                    });
                }
                StatusClass::Running => {}
            }

            if deadline.is_some_and(|limit| Instant::now() > limit) {
                return Err(ApiError::Timeout {
                    execution_id: execution.to_string(),
                    last_status: status,
                });
            }
            sleep(profile.poll_interval).await;
        }
    }
}
