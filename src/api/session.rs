//! Credential exchange for a session token.

use reqwest::Method;
use serde_json::json;
use tracing::info;

use super::client::{ApiCall, ManagerClient};
use super::error::ApiError;
use super::transport::{BasicCredentials, Dispatch};

/// Opaque token attached to every authenticated call of a run.
#[derive(Clone, Eq, PartialEq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps a token value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

impl<D: Dispatch> ManagerClient<D> {
    /// Exchanges the profile's credentials for a session token.
    ///
    /// Credentials travel both as basic authentication and in the JSON body
    /// so managers accepting either form succeed.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Authentication`] when the manager answers with an
    /// error status and [`ApiError::MissingToken`] when the response has no
    /// `value`.
    pub async fn authenticate(&self) -> Result<SessionToken, ApiError> {
        let profile = self.profile();
        let mut payload = json!({
            "username": profile.username,
            "password": profile.password,
        });
        if let (Some(tenant), Some(fields)) = (&profile.tenant, payload.as_object_mut()) {
            fields.insert(String::from("tenant_name"), json!(tenant));
        }

        info!(api_version = %profile.api_version, "authenticating to manager");
        let response = self
            .call(
                ApiCall::new(Method::POST, "tokens")
                    .basic_auth(BasicCredentials {
                        username: profile.username.clone(),
                        password: profile.password.clone(),
                    })
                    .json(payload),
            )
            .await?;

        if response.is_error() {
            return Err(ApiError::Authentication {
                status: response.status,
                body: response.text,
            });
        }

        let Some(token) = response
            .str_field("value")
            .filter(|token| !token.is_empty())
            .map(SessionToken::new)
        else {
            return Err(ApiError::MissingToken {
                body: response.text,
            });
        };
        Ok(token)
    }
}
