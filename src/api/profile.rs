//! Connection profile threaded through every manager call.

use std::time::Duration;

use thiserror::Error;

use super::execution::StatusVocabulary;

/// API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "v3.1";
/// Per-request HTTP timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Overall execution wait timeout used when none is configured.
pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(3600);
/// Interval between execution status polls used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Number of attempts the transport makes before giving up.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;
/// Base delay for the linear retry backoff.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Bounded linear retry policy applied by the transport.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy making at most `attempts` calls (at least one).
    #[must_use]
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Maximum number of attempts per request.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay slept after the given failed attempt (1-based) before the next.
    #[must_use]
    pub const fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BACKOFF)
    }
}

/// Everything needed to talk to one manager for the duration of a run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectionProfile {
    /// Manager base address, for example `https://cfy.example.com`.
    pub manager_url: String,
    /// Username exchanged for a session token.
    pub username: String,
    /// Password exchanged for a session token.
    pub password: String,
    /// Tenant scope sent with every request when present.
    pub tenant: Option<String>,
    /// API version, with or without a leading `api/` segment.
    pub api_version: String,
    /// Disables TLS certificate verification when set.
    pub insecure: bool,
    /// Timeout applied to each individual HTTP request.
    pub request_timeout: Duration,
    /// Upper bound on how long an execution is polled.
    pub exec_timeout: Duration,
    /// Constant delay between execution polls.
    pub poll_interval: Duration,
    /// Transport retry behaviour.
    pub retry: RetryPolicy,
    /// Status strings treated as terminal.
    pub statuses: StatusVocabulary,
}

impl ConnectionProfile {
    /// Starts a builder for a [`ConnectionProfile`].
    #[must_use]
    pub fn builder() -> ConnectionProfileBuilder {
        ConnectionProfileBuilder::new()
    }

    /// Builds the absolute URL for an API resource path.
    ///
    /// The version tolerates surrounding slashes and an `api/` prefix, so
    /// `v3.1`, `/v3.1/` and `api/v3.1` all resolve to `<base>/api/v3.1/...`.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        let base = self.manager_url.trim_end_matches('/');
        let trimmed = self.api_version.trim_matches('/');
        let version = trimmed.strip_prefix("api/").unwrap_or(trimmed);
        format!("{base}/api/{version}/{}", path.trim_start_matches('/'))
    }
}

/// Errors raised when a profile is missing required values.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProfileError {
    /// Raised when a required field is empty.
    #[error("missing or empty field: {0}")]
    Validation(String),
}

/// Builder for [`ConnectionProfile`] that fills in the documented defaults.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectionProfileBuilder {
    manager_url: String,
    username: String,
    password: String,
    tenant: Option<String>,
    api_version: String,
    insecure: bool,
    request_timeout: Duration,
    exec_timeout: Duration,
    poll_interval: Duration,
    retry: RetryPolicy,
    statuses: StatusVocabulary,
}

impl Default for ConnectionProfileBuilder {
    fn default() -> Self {
        Self {
            manager_url: String::new(),
            username: String::new(),
            password: String::new(),
            tenant: None,
            api_version: DEFAULT_API_VERSION.to_owned(),
            insecure: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            exec_timeout: DEFAULT_EXEC_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry: RetryPolicy::default(),
            statuses: StatusVocabulary::default(),
        }
    }
}

impl ConnectionProfileBuilder {
    /// Creates a builder populated with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the manager base address.
    #[must_use]
    pub fn manager_url(mut self, value: impl Into<String>) -> Self {
        self.manager_url = value.into();
        self
    }

    /// Sets the login credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Sets the optional tenant.
    #[must_use]
    pub fn tenant(mut self, value: Option<String>) -> Self {
        self.tenant = value;
        self
    }

    /// Sets the API version string.
    #[must_use]
    pub fn api_version(mut self, value: impl Into<String>) -> Self {
        self.api_version = value.into();
        self
    }

    /// Toggles TLS verification off.
    #[must_use]
    pub const fn insecure(mut self, value: bool) -> Self {
        self.insecure = value;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, value: Duration) -> Self {
        self.request_timeout = value;
        self
    }

    /// Sets the execution wait timeout.
    #[must_use]
    pub const fn exec_timeout(mut self, value: Duration) -> Self {
        self.exec_timeout = value;
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, value: Duration) -> Self {
        self.poll_interval = value;
        self
    }

    /// Overrides the transport retry policy.
    #[must_use]
    pub const fn retry(mut self, value: RetryPolicy) -> Self {
        self.retry = value;
        self
    }

    /// Overrides the terminal status vocabulary.
    #[must_use]
    pub fn statuses(mut self, value: StatusVocabulary) -> Self {
        self.statuses = value;
        self
    }

    /// Builds the profile, trimming the address, user and tenant.
    ///
    /// A blank tenant is treated as no tenant.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Validation`] when the manager URL, username,
    /// password or API version is empty.
    pub fn build(self) -> Result<ConnectionProfile, ProfileError> {
        let profile = ConnectionProfile {
            manager_url: self.manager_url.trim().to_owned(),
            username: self.username.trim().to_owned(),
            password: self.password,
            tenant: self
                .tenant
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty()),
            api_version: self.api_version.trim().to_owned(),
            insecure: self.insecure,
            request_timeout: self.request_timeout,
            exec_timeout: self.exec_timeout,
            poll_interval: self.poll_interval,
            retry: self.retry,
            statuses: self.statuses,
        };

        if profile.manager_url.is_empty() {
            return Err(ProfileError::Validation("manager_url".to_owned()));
        }
        if profile.username.is_empty() {
            return Err(ProfileError::Validation("username".to_owned()));
        }
        if profile.password.is_empty() {
            return Err(ProfileError::Validation("password".to_owned()));
        }
        if profile.api_version.trim_matches('/').is_empty() {
            return Err(ProfileError::Validation("api_version".to_owned()));
        }
        Ok(profile)
    }
}
