//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::api::{
    ConnectionProfile, DEFAULT_API_VERSION, ProfileError, RetryPolicy, StatusVocabulary,
};

/// Manager connection settings derived from environment variables and
/// configuration files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "CFY",
    discovery(
        app_name = "cfy-deploy",
        env_var = "CFY_CONFIG_PATH",
        config_file_name = "cfy-deploy.toml",
        dotfile_name = ".cfy-deploy.toml",
        project_file_name = "cfy-deploy.toml"
    )
)]
pub struct ManagerConfig {
    /// Base URL of the manager (for example `https://cfy.example.com`).
    pub manager_url: Option<String>,
    /// Account used to request session tokens.
    pub username: Option<String>,
    /// Password for [`Self::username`].
    pub password: Option<String>,
    /// Tenant sent with every request when set.
    pub tenant: Option<String>,
    /// REST API version segment. Defaults to `v3.1`.
    #[ortho_config(default = DEFAULT_API_VERSION.to_owned())]
    pub api_version: String,
    /// Disables TLS certificate verification for self-signed managers.
    #[ortho_config(default = false)]
    pub insecure: bool,
    /// Per-request timeout in seconds.
    #[ortho_config(default = 60)]
    pub request_timeout_sec: u64,
    /// Upper bound on waiting for an execution, in seconds.
    #[ortho_config(default = 3600)]
    pub exec_timeout_sec: u64,
    /// Delay between execution status polls, in seconds.
    #[ortho_config(default = 10)]
    pub poll_interval_sec: u64,
    /// Comma-separated statuses that end an execution successfully.
    #[ortho_config(default = "terminated".to_owned())]
    pub success_statuses: String,
    /// Comma-separated statuses that end an execution with a failure.
    #[ortho_config(default = "failed,cancelled".to_owned())]
    pub failure_statuses: String,
}

/// Connection values supplied on the command line. Present values replace
/// whatever was loaded from files or the environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionOverrides {
    /// Replacement manager URL.
    pub manager_url: Option<String>,
    /// Replacement username.
    pub username: Option<String>,
    /// Replacement password.
    pub password: Option<String>,
    /// Replacement tenant.
    pub tenant: Option<String>,
    /// Replacement API version.
    pub api_version: Option<String>,
    /// Forces TLS verification off when `true`.
    pub insecure: bool,
    /// Replacement request timeout in seconds.
    pub request_timeout_sec: Option<u64>,
    /// Replacement execution timeout in seconds.
    pub exec_timeout_sec: Option<u64>,
    /// Replacement poll interval in seconds.
    pub poll_interval_sec: Option<u64>,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    flag: &'static str,
    env_var: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, flag: &'static str, env_var: &'static str) -> Self {
        Self {
            description,
            flag,
            env_var,
        }
    }
}

impl ManagerConfig {
    fn require_field<'a>(
        value: Option<&'a String>,
        metadata: &FieldMetadata,
    ) -> Result<&'a str, ConfigError> {
        match value.map(|text| text.trim()) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(ConfigError::MissingField(format!(
                "missing {}: pass {} or set {}",
                metadata.description, metadata.flag, metadata.env_var
            ))),
        }
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("cfy-deploy")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies command-line overrides on top of the loaded values.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConnectionOverrides) -> Self {
        let ConnectionOverrides {
            manager_url,
            username,
            password,
            tenant,
            api_version,
            insecure,
            request_timeout_sec,
            exec_timeout_sec,
            poll_interval_sec,
        } = overrides;

        self.manager_url = manager_url.or(self.manager_url);
        self.username = username.or(self.username);
        self.password = password.or(self.password);
        self.tenant = tenant.or(self.tenant);
        if let Some(version) = api_version {
            self.api_version = version;
        }
        self.insecure |= insecure;
        self.request_timeout_sec = request_timeout_sec.unwrap_or(self.request_timeout_sec);
        self.exec_timeout_sec = exec_timeout_sec.unwrap_or(self.exec_timeout_sec);
        self.poll_interval_sec = poll_interval_sec.unwrap_or(self.poll_interval_sec);
        self
    }

    /// Builds the immutable [`ConnectionProfile`] for a run. Error messages
    /// name the flag and environment variable that supply a missing value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the manager URL or a
    /// credential is absent and [`ConfigError::Invalid`] when the profile
    /// fails validation.
    pub fn to_profile(&self) -> Result<ConnectionProfile, ConfigError> {
        let manager_url = Self::require_field(
            self.manager_url.as_ref(),
            &FieldMetadata::new("manager URL", "--manager", "CFY_MANAGER_URL"),
        )?;
        let username = Self::require_field(
            self.username.as_ref(),
            &FieldMetadata::new("manager username", "--username", "CFY_USERNAME"),
        )?;
        let password = Self::require_field(
            self.password.as_ref(),
            &FieldMetadata::new("manager password", "--password", "CFY_PASSWORD"),
        )?;
        if self.poll_interval_sec == 0 {
            return Err(ConfigError::Invalid(String::from(
                "poll interval must be at least one second",
            )));
        }

        ConnectionProfile::builder()
            .manager_url(manager_url)
            .credentials(username, password)
            .tenant(self.tenant.clone())
            .api_version(&self.api_version)
            .insecure(self.insecure)
            .request_timeout(Duration::from_secs(self.request_timeout_sec))
            .exec_timeout(Duration::from_secs(self.exec_timeout_sec))
            .poll_interval(Duration::from_secs(self.poll_interval_sec))
            .retry(RetryPolicy::default())
            .statuses(StatusVocabulary::from_lists(
                &self.success_statuses,
                &self.failure_statuses,
            ))
            .build()
            .map_err(ConfigError::from)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a configured value is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ProfileError> for ConfigError {
    fn from(value: ProfileError) -> Self {
        Self::Invalid(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn loaded() -> ManagerConfig {
        ManagerConfig {
            manager_url: Some(String::from("https://cfy.example.com")),
            username: Some(String::from("admin")),
            password: Some(String::from("secret")),
            tenant: None,
            api_version: DEFAULT_API_VERSION.to_owned(),
            insecure: false,
            request_timeout_sec: 60,
            exec_timeout_sec: 3600,
            poll_interval_sec: 10,
            success_statuses: String::from("terminated"),
            failure_statuses: String::from("failed,cancelled"),
        }
    }

    #[test]
    fn builds_profile_from_loaded_values() {
        let profile = loaded()
            .to_profile()
            .unwrap_or_else(|err| panic!("profile should build: {err}"));
        assert_eq!(profile.manager_url, "https://cfy.example.com");
        assert_eq!(profile.api_version, "v3.1");
        assert_eq!(profile.exec_timeout, Duration::from_secs(3600));
        assert_eq!(profile.poll_interval, Duration::from_secs(10));
        assert_eq!(profile.retry, RetryPolicy::default());
        assert_eq!(profile.statuses, StatusVocabulary::default());
        assert!(!profile.insecure);
    }

    #[test]
    fn overrides_replace_loaded_values() {
        let config = loaded().with_overrides(ConnectionOverrides {
            manager_url: Some(String::from("https://other.example.com")),
            tenant: Some(String::from("ops")),
            insecure: true,
            poll_interval_sec: Some(2),
            ..ConnectionOverrides::default()
        });
        assert_eq!(
            config.manager_url.as_deref(),
            Some("https://other.example.com")
        );
        assert_eq!(config.username.as_deref(), Some("admin"));
        assert_eq!(config.tenant.as_deref(), Some("ops"));
        assert!(config.insecure);
        assert_eq!(config.poll_interval_sec, 2);
        assert_eq!(config.exec_timeout_sec, 3600);
    }

    #[test]
    fn empty_overrides_keep_loaded_values() {
        assert_eq!(
            loaded().with_overrides(ConnectionOverrides::default()),
            loaded()
        );
    }

    #[rstest]
    #[case::manager(ManagerConfig { manager_url: None, ..loaded() }, "--manager or set CFY_MANAGER_URL")]
    #[case::username(ManagerConfig { username: Some(String::from("  ")), ..loaded() }, "--username or set CFY_USERNAME")]
    #[case::password(ManagerConfig { password: None, ..loaded() }, "--password or set CFY_PASSWORD")]
    fn missing_fields_name_their_sources(#[case] config: ManagerConfig, #[case] hint: &str) {
        let err = config.to_profile().expect_err("missing field should fail");
        assert!(
            matches!(err, ConfigError::MissingField(ref message) if message.contains(hint)),
            "unexpected: {err}"
        );
    }

    #[test]
    fn custom_status_lists_reach_the_profile() {
        let config = ManagerConfig {
            success_statuses: String::from("terminated, completed"),
            failure_statuses: String::from("failed"),
            ..loaded()
        };
        let profile = config
            .to_profile()
            .unwrap_or_else(|err| panic!("profile should build: {err}"));
        assert_eq!(profile.statuses.success(), ["terminated", "completed"]);
        assert_eq!(profile.statuses.failure(), ["failed"]);
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let config = ManagerConfig {
            poll_interval_sec: 0,
            ..loaded()
        };
        assert!(matches!(config.to_profile(), Err(ConfigError::Invalid(_))));
    }
}
