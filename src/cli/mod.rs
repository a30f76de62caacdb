//! Command-line interface definitions for the `cfy-deploy` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Args, Parser, ValueEnum};

/// Top-level CLI for the `cfy-deploy` binary.
#[derive(Debug, Parser)]
#[command(
    name = "cfy-deploy",
    about = "Publish a blueprint and run a deployment workflow on an orchestration manager",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Upload a blueprint, ensure its deployment exists, and run a workflow.
    #[command(
        name = "deploy",
        about = "Upload a blueprint, ensure its deployment exists, and run a workflow"
    )]
    Deploy(DeployCommand),
}

/// Workflows the `deploy` subcommand can start.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub(crate) enum Workflow {
    /// Install the deployment's node instances.
    #[default]
    Install,
    /// Apply an updated blueprint to an existing deployment.
    Update,
}

impl Workflow {
    /// Workflow identifier understood by the manager.
    pub(crate) const fn id(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Update => "update",
        }
    }
}

/// Manager connection flags. Each one overrides the matching `CFY_*`
/// environment variable or configuration file value.
#[derive(Debug, Args)]
pub(crate) struct ConnectionArgs {
    /// Manager base URL (for example `https://cfy.example.com`).
    #[arg(long = "manager", value_name = "URL")]
    pub(crate) manager_url: Option<String>,
    /// Manager username.
    #[arg(long, value_name = "USER")]
    pub(crate) username: Option<String>,
    /// Manager password.
    #[arg(long, value_name = "PASSWORD")]
    pub(crate) password: Option<String>,
    /// Tenant sent with every request.
    #[arg(long, value_name = "TENANT")]
    pub(crate) tenant: Option<String>,
    /// REST API version segment (defaults to `v3.1`).
    #[arg(long, value_name = "VERSION")]
    pub(crate) api_version: Option<String>,
    /// Disable TLS certificate verification (self-signed managers).
    #[arg(long)]
    pub(crate) insecure: bool,
    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) request_timeout_sec: Option<u64>,
    /// Maximum time to wait for the workflow execution, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) exec_timeout_sec: Option<u64>,
    /// Delay between execution status polls, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) poll_interval_sec: Option<u64>,
}

/// Arguments for the `cfy-deploy deploy` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct DeployCommand {
    /// Connection overrides.
    #[command(flatten)]
    pub(crate) connection: ConnectionArgs,
    /// Identifier the blueprint is published under.
    #[arg(long, value_name = "ID")]
    pub(crate) blueprint_id: String,
    /// Directory containing the blueprint; it is zipped before upload.
    #[arg(long, value_name = "DIR")]
    pub(crate) blueprint_dir: String,
    /// Blueprint entry point inside the directory.
    #[arg(long, value_name = "FILE", default_value = "blueprint.yaml")]
    pub(crate) application_file: String,
    /// Deployment to create or update.
    #[arg(long, value_name = "ID")]
    pub(crate) deployment_id: String,
    /// YAML file with deployment inputs; repeat to merge several, later files win.
    #[arg(long = "inputs-file", value_name = "PATH")]
    pub(crate) inputs_files: Vec<String>,
    /// Workflow to run against the deployment.
    #[arg(long, value_enum, default_value_t = Workflow::Install)]
    pub(crate) workflow: Workflow,
    /// Fail instead of creating the deployment when it does not exist.
    #[arg(long)]
    pub(crate) no_create: bool,
    /// Return once the workflow has started instead of waiting for it.
    #[arg(long)]
    pub(crate) no_wait: bool,
}
