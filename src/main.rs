//! Binary entry point for the `cfy-deploy` CLI.

mod cli;

use std::future::Future;
use std::io::{self, Write};
use std::process;

use camino::Utf8Path;
use clap::Parser;
use thiserror::Error;
use tracing::info;

use cfy_deploy::{
    ArchiveError, ConfigError, ConnectionOverrides, DeployError, DeployOrchestrator, DeployPlan,
    InputError, InputSet, ManagerClient, ManagerConfig, PlanError, stage_blueprint,
};
use cli::{Cli, ConnectionArgs, DeployCommand};

const EXIT_FAILURE: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Plan(#[from] PlanError),
    #[error("{0}")]
    Inputs(#[from] InputError),
    #[error("{0}")]
    Archive(#[from] ArchiveError),
    #[error("{0}")]
    Deploy(#[from] DeployError),
    #[error("interrupted")]
    Interrupted,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code =
        run_until_interrupted(dispatch(cli), tokio::signal::ctrl_c(), io::stderr()).await;

    process::exit(exit_code);
}

/// Races the command against an interrupt and maps the result to an exit
/// code. An interrupt drops the command future, which releases anything it
/// staged.
async fn run_until_interrupted(
    work: impl Future<Output = Result<(), CliError>>,
    interrupt: impl Future<Output = io::Result<()>>,
    mut stderr: impl Write,
) -> i32 {
    tokio::select! {
        result = work => match result {
            Ok(()) => 0,
            Err(err) => {
                write_error(&mut stderr, &err);
                EXIT_FAILURE
            }
        },
        Ok(()) = interrupt => {
            write_error(&mut stderr, &CliError::Interrupted);
            EXIT_INTERRUPTED
        }
    }
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli {
        Cli::Deploy(command) => run_deploy(&command).await,
    }
}

async fn run_deploy(command: &DeployCommand) -> Result<(), CliError> {
    let config = ManagerConfig::load_without_cli_args()?
        .with_overrides(connection_overrides(&command.connection));
    let profile = config.to_profile()?;
    let plan = build_plan(command)?;

    let archive = stage_blueprint(Utf8Path::new(&command.blueprint_dir), &plan.blueprint_id)?;
    let client = ManagerClient::connect(profile).map_err(DeployError::from)?;
    let outcome = DeployOrchestrator::new(client)
        .execute(&plan, archive.path())
        .await?;

    info!(
        deployment_id = %plan.deployment_id,
        execution_id = %outcome.execution,
        created = outcome.created_deployment,
        "deploy finished"
    );
    writeln!(io::stdout(), "{}", outcome.execution).ok();
    Ok(())
}

fn connection_overrides(args: &ConnectionArgs) -> ConnectionOverrides {
    ConnectionOverrides {
        manager_url: args.manager_url.clone(),
        username: args.username.clone(),
        password: args.password.clone(),
        tenant: args.tenant.clone(),
        api_version: args.api_version.clone(),
        insecure: args.insecure,
        request_timeout_sec: args.request_timeout_sec,
        exec_timeout_sec: args.exec_timeout_sec,
        poll_interval_sec: args.poll_interval_sec,
    }
}

fn build_plan(command: &DeployCommand) -> Result<DeployPlan, CliError> {
    let inputs = InputSet::from_files(&command.inputs_files)?;
    let plan = DeployPlan::builder()
        .blueprint_id(&command.blueprint_id)
        .application_file(&command.application_file)
        .deployment_id(&command.deployment_id)
        .workflow_id(command.workflow.id())
        .inputs(inputs)
        .create_if_missing(!command.no_create)
        .wait(!command.no_wait)
        .build()?;
    Ok(plan)
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "cfy-deploy: {err}").ok();
}
