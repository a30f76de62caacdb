//! Tests for layered manager configuration.

use std::time::Duration;

use cfy_deploy::test_support::EnvGuard;
use cfy_deploy::{ConfigError, ConnectionOverrides, ManagerConfig, StatusVocabulary};

#[tokio::test]
async fn loads_connection_settings_from_environment() {
    let _guard = EnvGuard::set_vars(&[
        ("CFY_MANAGER_URL", "https://cfy.example.com/"),
        ("CFY_USERNAME", "admin"),
        ("CFY_PASSWORD", "secret"),
        ("CFY_TENANT", "ops"),
        ("CFY_API_VERSION", "v3"),
        ("CFY_EXEC_TIMEOUT_SEC", "120"),
        ("CFY_POLL_INTERVAL_SEC", "3"),
        ("CFY_INSECURE", "true"),
        ("CFY_FAILURE_STATUSES", "failed,cancelled,force_cancelling"),
    ])
    .await;

    let config = ManagerConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("config should load: {err}"));
    let profile = config
        .to_profile()
        .unwrap_or_else(|err| panic!("profile should build: {err}"));

    assert_eq!(
        profile.api_url("executions"),
        "https://cfy.example.com/api/v3/executions"
    );
    assert_eq!(profile.tenant.as_deref(), Some("ops"));
    assert_eq!(profile.exec_timeout, Duration::from_secs(120));
    assert_eq!(profile.poll_interval, Duration::from_secs(3));
    assert!(profile.insecure);
    assert_eq!(
        profile.statuses.failure(),
        ["failed", "cancelled", "force_cancelling"]
    );
    assert_eq!(profile.statuses.success(), ["terminated"]);
}

#[tokio::test]
async fn command_line_overrides_win_over_environment() {
    let _guard = EnvGuard::set_vars(&[
        ("CFY_MANAGER_URL", "https://env.example.com"),
        ("CFY_USERNAME", "env-user"),
        ("CFY_PASSWORD", "env-secret"),
    ])
    .await;

    let profile = ManagerConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("config should load: {err}"))
        .with_overrides(ConnectionOverrides {
            manager_url: Some(String::from("https://flag.example.com")),
            username: Some(String::from("flag-user")),
            ..ConnectionOverrides::default()
        })
        .to_profile()
        .unwrap_or_else(|err| panic!("profile should build: {err}"));

    assert_eq!(profile.manager_url, "https://flag.example.com");
    assert_eq!(profile.username, "flag-user");
    assert_eq!(profile.password, "env-secret");
}

#[tokio::test]
async fn defaults_apply_when_only_credentials_are_set() {
    let _guard = EnvGuard::set_vars(&[
        ("CFY_MANAGER_URL", "http://localhost:8080"),
        ("CFY_USERNAME", "admin"),
        ("CFY_PASSWORD", "admin"),
    ])
    .await;

    let config = ManagerConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("config should load: {err}"));

    assert_eq!(config.api_version, "v3.1");
    assert_eq!(config.request_timeout_sec, 60);
    assert_eq!(config.exec_timeout_sec, 3600);
    assert_eq!(config.poll_interval_sec, 10);
    let profile = config
        .to_profile()
        .unwrap_or_else(|err| panic!("profile should build: {err}"));
    assert_eq!(profile.statuses, StatusVocabulary::default());
}

#[tokio::test]
async fn malformed_environment_value_is_a_parse_error() {
    let _guard = EnvGuard::set_vars(&[
        ("CFY_MANAGER_URL", "http://localhost:8080"),
        ("CFY_POLL_INTERVAL_SEC", "soon"),
    ])
    .await;

    let error = ManagerConfig::load_without_cli_args().expect_err("non-numeric interval");
    assert!(
        matches!(error, ConfigError::Parse(_)),
        "expected Parse error, got {error}"
    );
}

#[test]
fn missing_manager_url_names_flag_and_variable() {
    let config = ManagerConfig {
        manager_url: None,
        username: Some(String::from("admin")),
        password: Some(String::from("secret")),
        tenant: None,
        api_version: String::from("v3.1"),
        insecure: false,
        request_timeout_sec: 60,
        exec_timeout_sec: 3600,
        poll_interval_sec: 10,
        success_statuses: String::from("terminated"),
        failure_statuses: String::from("failed,cancelled"),
    };

    let error = config.to_profile().expect_err("manager URL is required");
    let ConfigError::MissingField(ref message) = error else {
        panic!("expected MissingField error, got {error}");
    };
    assert!(message.contains("--manager"), "{message}");
    assert!(message.contains("CFY_MANAGER_URL"), "{message}");
}
