//! Core library for the `cfy-deploy` blueprint deployment tool.
//!
//! The crate packages a blueprint directory, publishes it to an orchestration
//! manager over its REST API, ensures the target deployment exists and runs a
//! workflow against it (authenticate → upload → create → execute → poll).

pub mod api;
pub mod archive;
pub mod config;
pub mod deploy;
pub mod inputs;
pub mod plan;
pub mod test_support;

pub use api::{
    ApiError, ConnectionProfile, ConnectionProfileBuilder, Dispatch, ExecutionHandle,
    ManagerClient, ReqwestDispatcher, RetryPolicy, SessionToken, StatusClass, StatusVocabulary,
};
pub use archive::{ArchiveError, StagedArchive, stage_blueprint, stage_blueprint_in};
pub use config::{ConfigError, ConnectionOverrides, ManagerConfig};
pub use deploy::{DeployError, DeployOrchestrator, DeployOutcome};
pub use inputs::{InputError, InputSet, load_input_file};
pub use plan::{DEFAULT_APPLICATION_FILE, DEFAULT_WORKFLOW, DeployPlan, DeployPlanBuilder, PlanError};
