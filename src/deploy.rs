//! Orchestrates the end-to-end deploy pipeline.
//!
//! A run authenticates against the manager, publishes the staged blueprint
//! archive, makes sure the deployment exists, starts the requested workflow
//! and optionally waits for it to finish. Each stage runs once; transient
//! HTTP failures are retried by the transport underneath.

use camino::Utf8Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, Dispatch, ExecutionHandle, ManagerClient};
use crate::plan::DeployPlan;

/// Errors surfaced while running the deploy pipeline.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum DeployError {
    /// Raised when a manager call fails.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Raised when the deployment is absent and auto-create is disabled.
    #[error("deployment {0} is missing and auto-create is disabled")]
    DeploymentMissing(String),
}

/// Result of a successful pipeline run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeployOutcome {
    /// Execution started for the workflow.
    pub execution: ExecutionHandle,
    /// True when the deployment had to be created.
    pub created_deployment: bool,
    /// True when the execution was awaited to a success status.
    pub awaited: bool,
}

/// Drives a [`DeployPlan`] against a manager.
#[derive(Debug)]
pub struct DeployOrchestrator<D> {
    client: ManagerClient<D>,
}

impl<D: Dispatch> DeployOrchestrator<D> {
    /// Creates an orchestrator over `client`.
    #[must_use]
    pub const fn new(client: ManagerClient<D>) -> Self {
        Self { client }
    }

    /// Returns the manager client.
    #[must_use]
    pub const fn client(&self) -> &ManagerClient<D> {
        &self.client
    }

    /// Runs the pipeline with an already staged blueprint archive.
    ///
    /// The caller owns `archive` for the duration of the run; it is only
    /// read here.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Api`] when any manager call fails and
    /// [`DeployError::DeploymentMissing`] when the deployment does not exist
    /// and the plan disables auto-create.
    pub async fn execute(
        &self,
        plan: &DeployPlan,
        archive: &Utf8Path,
    ) -> Result<DeployOutcome, DeployError> {
        let token = self.client.authenticate().await?;

        self.client
            .publish_blueprint(&token, &plan.blueprint_id, archive, &plan.application_file)
            .await?;

        let created_deployment = if self
            .client
            .deployment_exists(&token, &plan.deployment_id)
            .await?
        {
            info!(deployment_id = %plan.deployment_id, "deployment already exists");
            if !plan.inputs.is_empty() {
                warn!(
                    deployment_id = %plan.deployment_id,
                    "inputs are only applied when creating a deployment; ignoring them"
                );
            }
            false
        } else if plan.create_if_missing {
            self.client
                .create_deployment(
                    &token,
                    &plan.deployment_id,
                    &plan.blueprint_id,
                    &plan.inputs,
                )
                .await?;
            true
        } else {
            return Err(DeployError::DeploymentMissing(plan.deployment_id.clone()));
        };

        let execution = self
            .client
            .start_execution(
                &token,
                &plan.deployment_id,
                &plan.workflow_id,
                Some(&plan.parameters),
            )
            .await?;

        if plan.wait {
            self.client.await_execution(&token, &execution).await?;
        } else {
            info!(execution_id = %execution, "not waiting for execution to finish");
        }

        Ok(DeployOutcome {
            execution,
            created_deployment,
            awaited: plan.wait,
        })
    }
}
