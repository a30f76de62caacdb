//! Deployment existence checks and creation.

use reqwest::Method;
use serde_json::json;
use tracing::info;

use super::client::{ApiCall, ManagerClient};
use super::error::ApiError;
use super::session::SessionToken;
use super::transport::Dispatch;
use crate::inputs::InputSet;

impl<D: Dispatch> ManagerClient<D> {
    /// Reports whether `deployment_id` exists on the manager.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ExistenceCheck`] for any status other than 404 or
    /// 2xx; "not found" is the only status mapped to `false`.
    pub async fn deployment_exists(
        &self,
        token: &SessionToken,
        deployment_id: &str,
    ) -> Result<bool, ApiError> {
        let response = self
            .call(ApiCall::new(Method::GET, format!("deployments/{deployment_id}")).token(token))
            .await?;

        if response.status == 404 {
            return Ok(false);
        }
        if response.is_success() {
            return Ok(true);
        }
        Err(ApiError::ExistenceCheck {
            deployment_id: deployment_id.to_owned(),
            status: response.status,
        })
    }

    /// Creates `deployment_id` from `blueprint_id` with the given inputs.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Creation`] when the manager rejects the request.
    pub async fn create_deployment(
        &self,
        token: &SessionToken,
        deployment_id: &str,
        blueprint_id: &str,
        inputs: &InputSet,
    ) -> Result<(), ApiError> {
        info!(deployment_id, blueprint_id, inputs = inputs.len(), "creating deployment");
        let response = self
            .call(
                ApiCall::new(Method::PUT, format!("deployments/{deployment_id}"))
                    .token(token)
                    .json(json!({
                        "blueprint_id": blueprint_id,
                        "inputs": inputs,
                    })),
            )
            .await?;

        if response.is_error() {
            return Err(ApiError::Creation {
                status: response.status,
                body: response.text,
            });
        }
        info!(deployment_id, "deployment created");
        Ok(())
    }
}
