//! Description of a single deploy run.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::inputs::InputSet;

/// Default blueprint entry point inside the archive.
pub const DEFAULT_APPLICATION_FILE: &str = "blueprint.yaml";

/// Workflow run when none is chosen explicitly.
pub const DEFAULT_WORKFLOW: &str = "install";

/// Characters that would split or truncate an id used as a URL path segment.
const URL_RESERVED: [char; 3] = ['/', '?', '#'];

/// Everything the orchestrator needs to publish and run one deployment.
#[derive(Clone, Debug, PartialEq)]
pub struct DeployPlan {
    /// Identifier the blueprint is published under.
    pub blueprint_id: String,
    /// Entry point file inside the blueprint archive.
    pub application_file: String,
    /// Deployment to create or update.
    pub deployment_id: String,
    /// Workflow started against the deployment (for example `install`).
    pub workflow_id: String,
    /// Inputs used when the deployment has to be created.
    pub inputs: InputSet,
    /// Optional workflow parameters.
    pub parameters: Map<String, Value>,
    /// Creates the deployment when it does not exist yet.
    pub create_if_missing: bool,
    /// Polls the execution until it reaches a terminal status.
    pub wait: bool,
}

impl DeployPlan {
    /// Starts a builder for a [`DeployPlan`].
    #[must_use]
    pub fn builder() -> DeployPlanBuilder {
        DeployPlanBuilder::new()
    }

    /// Validates that every identifier is present.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Validation`] naming the first empty field, or
    /// the first id that would not stay a single URL path segment.
    pub fn validate(&self) -> Result<(), PlanError> {
        for (field, value) in [
            ("blueprint_id", &self.blueprint_id),
            ("application_file", &self.application_file),
            ("deployment_id", &self.deployment_id),
            ("workflow_id", &self.workflow_id),
        ] {
            if value.is_empty() {
                return Err(PlanError::Validation(field.to_owned()));
            }
        }
        for (field, value) in [
            ("blueprint_id", &self.blueprint_id),
            ("deployment_id", &self.deployment_id),
        ] {
            if value.contains(URL_RESERVED) {
                return Err(PlanError::Validation(format!(
                    "{field} must not contain '/', '?' or '#'"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`DeployPlan`] that trims identifiers and validates on build.
#[derive(Clone, Debug, PartialEq)]
pub struct DeployPlanBuilder {
    blueprint_id: String,
    application_file: String,
    deployment_id: String,
    workflow_id: String,
    inputs: InputSet,
    parameters: Map<String, Value>,
    create_if_missing: bool,
    wait: bool,
}

impl Default for DeployPlanBuilder {
    fn default() -> Self {
        Self {
            blueprint_id: String::new(),
            application_file: DEFAULT_APPLICATION_FILE.to_owned(),
            deployment_id: String::new(),
            workflow_id: DEFAULT_WORKFLOW.to_owned(),
            inputs: InputSet::new(),
            parameters: Map::new(),
            create_if_missing: true,
            wait: true,
        }
    }
}

impl DeployPlanBuilder {
    /// Creates a builder with the default application file and workflow,
    /// auto-create enabled and waiting enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the blueprint identifier.
    #[must_use]
    pub fn blueprint_id(mut self, value: impl Into<String>) -> Self {
        self.blueprint_id = value.into();
        self
    }

    /// Sets the application file.
    #[must_use]
    pub fn application_file(mut self, value: impl Into<String>) -> Self {
        self.application_file = value.into();
        self
    }

    /// Sets the deployment identifier.
    #[must_use]
    pub fn deployment_id(mut self, value: impl Into<String>) -> Self {
        self.deployment_id = value.into();
        self
    }

    /// Sets the workflow identifier.
    #[must_use]
    pub fn workflow_id(mut self, value: impl Into<String>) -> Self {
        self.workflow_id = value.into();
        self
    }

    /// Sets the deployment inputs.
    #[must_use]
    pub fn inputs(mut self, value: InputSet) -> Self {
        self.inputs = value;
        self
    }

    /// Sets the workflow parameters.
    #[must_use]
    pub fn parameters(mut self, value: Map<String, Value>) -> Self {
        self.parameters = value;
        self
    }

    /// Enables or disables creating a missing deployment.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Enables or disables waiting for the execution to finish.
    #[must_use]
    pub const fn wait(mut self, value: bool) -> Self {
        self.wait = value;
        self
    }

    /// Builds and validates the [`DeployPlan`].
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Validation`] when an identifier is empty after
    /// trimming.
    pub fn build(self) -> Result<DeployPlan, PlanError> {
        let plan = DeployPlan {
            blueprint_id: self.blueprint_id.trim().to_owned(),
            application_file: self.application_file.trim().to_owned(),
            deployment_id: self.deployment_id.trim().to_owned(),
            workflow_id: self.workflow_id.trim().to_owned(),
            inputs: self.inputs,
            parameters: self.parameters,
            create_if_missing: self.create_if_missing,
            wait: self.wait,
        };
        plan.validate()?;
        Ok(plan)
    }
}

/// Errors raised while assembling a [`DeployPlan`].
#[derive(Debug, Error, Eq, PartialEq)]
pub enum PlanError {
    /// Raised when a required field is missing or malformed.
    #[error("invalid deploy plan: {0}")]
    Validation(String),
}
