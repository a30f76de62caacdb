//! BDD step definitions for the deploy pipeline.

use std::time::Duration;

use cfy_deploy::test_support::ScriptedDispatcher;
use cfy_deploy::{
    ConnectionProfile, DeployOrchestrator, DeployPlan, ManagerClient, stage_blueprint_in,
};
use reqwest::Method;
use rstest_bdd_macros::{given, then, when};
use serde_json::json;
use tokio::runtime::Builder;

use super::test_helpers::{DeployContext, DeployResult};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a manager that issues token \"{token}\"")]
fn manager_issues_token(deploy_context: DeployContext, token: String) -> DeployContext {
    deploy_context
        .dispatcher
        .push_json(200, &json!({"value": token}));
    deploy_context
}

#[given("the blueprint upload succeeds")]
fn upload_succeeds(deploy_context: DeployContext) -> DeployContext {
    deploy_context
        .dispatcher
        .push_json(201, &json!({"id": "web-app"}));
    deploy_context
}

#[given("the deployment does not exist")]
fn deployment_absent(deploy_context: DeployContext) -> DeployContext {
    deploy_context.dispatcher.push_response(404, "not found");
    deploy_context
}

#[given("the deployment already exists")]
fn deployment_present(deploy_context: DeployContext) -> DeployContext {
    deploy_context
        .dispatcher
        .push_json(200, &json!({"id": "web-prod"}));
    deploy_context
}

#[given("the deployment can be created")]
fn deployment_creatable(deploy_context: DeployContext) -> DeployContext {
    deploy_context
        .dispatcher
        .push_json(201, &json!({"id": "web-prod"}));
    deploy_context
}

#[given("the workflow starts as execution \"{execution_id}\"")]
fn workflow_starts(deploy_context: DeployContext, execution_id: String) -> DeployContext {
    deploy_context
        .dispatcher
        .push_json(201, &json!({"id": execution_id, "status": "pending"}));
    deploy_context
}

#[given("the workflow start response has no id")]
fn workflow_start_without_id(deploy_context: DeployContext) -> DeployContext {
    deploy_context
        .dispatcher
        .push_json(201, &json!({"status": "pending"}));
    deploy_context
}

#[given("the execution reports \"{status}\" \"{count}\" times")]
fn execution_reports(deploy_context: DeployContext, status: String, count: usize) -> DeployContext {
    for _ in 0..count {
        deploy_context.dispatcher.push_status("exec", &status);
    }
    deploy_context
}

#[given("auto-create is disabled")]
fn auto_create_disabled(mut deploy_context: DeployContext) -> DeployContext {
    deploy_context.create_if_missing = false;
    deploy_context
}

#[given("waiting is disabled")]
fn waiting_disabled(mut deploy_context: DeployContext) -> DeployContext {
    deploy_context.wait = false;
    deploy_context
}

#[when("I run the deploy")]
fn run_deploy(deploy_context: DeployContext) -> Result<DeployContext, StepError> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .map_err(|err| StepError::Assertion(err.to_string()))?;

    let profile = ConnectionProfile::builder()
        .manager_url("http://manager.local")
        .credentials("admin", "secret")
        .exec_timeout(Duration::from_secs(30))
        .poll_interval(Duration::from_secs(10))
        .build()
        .map_err(|err| StepError::Assertion(err.to_string()))?;
    let plan = DeployPlan::builder()
        .blueprint_id("web-app")
        .deployment_id("web-prod")
        .create_if_missing(deploy_context.create_if_missing)
        .wait(deploy_context.wait)
        .build()
        .map_err(|err| StepError::Assertion(err.to_string()))?;

    let archive = stage_blueprint_in(
        &deploy_context.blueprint_dir,
        &plan.blueprint_id,
        &deploy_context.scratch_dir,
    )
    .map_err(|err| StepError::Assertion(err.to_string()))?;
    let staged_path = archive.path().to_owned();

    let orchestrator = DeployOrchestrator::new(ManagerClient::new(
        profile,
        deploy_context.dispatcher.clone(),
    ));
    let result = runtime.block_on(async {
        let result = orchestrator.execute(&plan, archive.path()).await;
        drop(archive);
        result
    });

    let outcome = match result {
        Ok(outcome) => DeployResult::Success {
            execution_id: outcome.execution.to_string(),
        },
        Err(err) => DeployResult::Failure(err.to_string()),
    };

    Ok(DeployContext {
        outcome: Some(outcome),
        staged_archive: Some(staged_path),
        ..deploy_context
    })
}

#[then("the deploy succeeds with execution \"{execution_id}\"")]
fn deploy_succeeds(deploy_context: &DeployContext, execution_id: String) -> Result<(), StepError> {
    match &deploy_context.outcome {
        Some(DeployResult::Success {
            execution_id: actual,
        }) if *actual == execution_id => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected success with {execution_id}, got {other:?}"
        ))),
    }
}

#[then("the deploy fails mentioning \"{text}\"")]
fn deploy_fails(deploy_context: &DeployContext, text: String) -> Result<(), StepError> {
    match &deploy_context.outcome {
        Some(DeployResult::Failure(message)) if message.contains(&text) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected failure mentioning {text:?}, got {other:?}"
        ))),
    }
}

#[then("the execution was polled \"{count}\" times")]
fn execution_polled(deploy_context: &DeployContext, count: usize) -> Result<(), StepError> {
    let polls = count_requests(&deploy_context.dispatcher, &Method::GET, "/executions/");
    if polls == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} polls, saw {polls}"
        )))
    }
}

#[then("the deployment was created")]
fn deployment_created(deploy_context: &DeployContext) -> Result<(), StepError> {
    match count_requests(&deploy_context.dispatcher, &Method::PUT, "/deployments/") {
        1 => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected one create request, saw {other}"
        ))),
    }
}

#[then("no deployment was created")]
fn deployment_not_created(deploy_context: &DeployContext) -> Result<(), StepError> {
    match count_requests(&deploy_context.dispatcher, &Method::PUT, "/deployments/") {
        0 => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected no create request, saw {other}"
        ))),
    }
}

#[then("the staged archive was removed")]
fn archive_removed(deploy_context: &DeployContext) -> Result<(), StepError> {
    let Some(path) = &deploy_context.staged_archive else {
        return Err(StepError::Assertion(String::from("no archive was staged")));
    };
    if path.exists() {
        Err(StepError::Assertion(format!("{path} still exists")))
    } else {
        Ok(())
    }
}

fn count_requests(dispatcher: &ScriptedDispatcher, method: &Method, fragment: &str) -> usize {
    dispatcher
        .requests()
        .iter()
        .filter(|request| request.method == *method && request.url.contains(fragment))
        .count()
}
