//! BDD scenarios for the deploy pipeline.

use rstest_bdd_macros::scenario;

use super::test_helpers::{DeployContext, deploy_context};

#[scenario(
    path = "tests/features/deploy.feature",
    name = "Create a missing deployment and wait for the install to finish"
)]
fn scenario_create_and_wait(deploy_context: DeployContext) {
    let _ = deploy_context;
}

#[scenario(
    path = "tests/features/deploy.feature",
    name = "Stop on the first failed status"
)]
fn scenario_failed_status(deploy_context: DeployContext) {
    let _ = deploy_context;
}

#[scenario(
    path = "tests/features/deploy.feature",
    name = "Reject a start response without an execution id"
)]
fn scenario_missing_execution_id(deploy_context: DeployContext) {
    let _ = deploy_context;
}

#[scenario(
    path = "tests/features/deploy.feature",
    name = "Refuse to create a deployment when auto-create is disabled"
)]
fn scenario_auto_create_disabled(deploy_context: DeployContext) {
    let _ = deploy_context;
}

#[scenario(
    path = "tests/features/deploy.feature",
    name = "Give up when the execution outlives the timeout"
)]
fn scenario_execution_timeout(deploy_context: DeployContext) {
    let _ = deploy_context;
}

#[scenario(
    path = "tests/features/deploy.feature",
    name = "Return without polling when waiting is disabled"
)]
fn scenario_no_wait(deploy_context: DeployContext) {
    let _ = deploy_context;
}
