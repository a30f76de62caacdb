//! Shared fixtures for deploy BDD scenarios.

use std::fs;
use std::sync::Arc;

use camino::Utf8PathBuf;
use cfy_deploy::test_support::ScriptedDispatcher;
use rstest::fixture;
use tempfile::TempDir;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct DeployContext {
    pub dispatcher: ScriptedDispatcher,
    pub blueprint_dir: Utf8PathBuf,
    pub scratch_dir: Utf8PathBuf,
    pub create_if_missing: bool,
    pub wait: bool,
    pub outcome: Option<DeployResult>,
    pub staged_archive: Option<Utf8PathBuf>,
    pub(crate) workspace: Arc<TempDir>,
}

#[derive(Clone, Debug)]
pub enum DeployResult {
    Success { execution_id: String },
    Failure(String),
}

#[derive(Clone, Debug, Error)]
pub enum DeployTestError {
    #[error("failed to create workspace: {0}")]
    Workspace(String),
}

#[fixture]
pub fn deploy_context_result() -> Result<DeployContext, DeployTestError> {
    build_deploy_context()
}

#[fixture]
pub fn deploy_context(
    deploy_context_result: Result<DeployContext, DeployTestError>,
) -> DeployContext {
    deploy_context_result
        .unwrap_or_else(|err| panic!("deploy context fixture should initialise: {err}"))
}

pub fn build_deploy_context() -> Result<DeployContext, DeployTestError> {
    let workspace =
        TempDir::new().map_err(|err| DeployTestError::Workspace(format!("tempdir: {err}")))?;
    let root = Utf8PathBuf::from_path_buf(workspace.path().to_path_buf()).map_err(|path| {
        DeployTestError::Workspace(format!("non-utf8 path: {}", path.display()))
    })?;

    let blueprint_dir = root.join("blueprint");
    let scratch_dir = root.join("scratch");
    for dir in [&blueprint_dir, &scratch_dir] {
        fs::create_dir_all(dir)
            .map_err(|err| DeployTestError::Workspace(format!("create {dir}: {err}")))?;
    }
    fs::write(
        blueprint_dir.join("blueprint.yaml"),
        "tosca_definitions_version: cloudify_dsl_1_3\n",
    )
    .map_err(|err| DeployTestError::Workspace(format!("write blueprint: {err}")))?;

    Ok(DeployContext {
        dispatcher: ScriptedDispatcher::new(),
        blueprint_dir,
        scratch_dir,
        create_if_missing: true,
        wait: true,
        outcome: None,
        staged_archive: None,
        workspace: Arc::new(workspace),
    })
}
