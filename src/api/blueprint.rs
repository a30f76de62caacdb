//! Blueprint archive upload.

use bytes::Bytes;
use camino::Utf8Path;
use reqwest::Method;
use tracing::info;

use super::client::{ARCHIVE_CONTENT_TYPE, ApiCall, ManagerClient};
use super::error::ApiError;
use super::session::SessionToken;
use super::transport::Dispatch;

impl<D: Dispatch> ManagerClient<D> {
    /// Uploads a packaged blueprint under `blueprint_id`.
    ///
    /// The manager overwrites an existing blueprint with the same id, so the
    /// call is safe to repeat. `application_file` names the entry file inside
    /// the archive.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ArchiveRead`] when the archive cannot be read and
    /// [`ApiError::Upload`] when the manager rejects it.
    pub async fn publish_blueprint(
        &self,
        token: &SessionToken,
        blueprint_id: &str,
        archive: &Utf8Path,
        application_file: &str,
    ) -> Result<(), ApiError> {
        let bytes = tokio::fs::read(archive)
            .await
            .map_err(|err| ApiError::ArchiveRead {
                path: archive.to_string(),
                message: err.to_string(),
            })?;

        self.publish_blueprint_bytes(token, blueprint_id, Bytes::from(bytes), application_file)
            .await
    }

    /// Uploads an in-memory blueprint archive under `blueprint_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Upload`] when the manager rejects the archive.
    pub async fn publish_blueprint_bytes(
        &self,
        token: &SessionToken,
        blueprint_id: &str,
        archive: Bytes,
        application_file: &str,
    ) -> Result<(), ApiError> {
        info!(
            blueprint_id,
            application_file,
            size = archive.len(),
            "uploading blueprint"
        );
        let response = self
            .call(
                ApiCall::new(Method::PUT, format!("blueprints/{blueprint_id}"))
                    .token(token)
                    .query("application_file", application_file)
                    .raw(archive, ARCHIVE_CONTENT_TYPE),
            )
            .await?;

        if response.is_error() {
            return Err(ApiError::Upload {
                status: response.status,
                body: response.text,
            });
        }
        info!(blueprint_id, "blueprint upload complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ConnectionProfile, RequestBody};
    use crate::test_support::ScriptedDispatcher;

    fn client() -> ManagerClient<ScriptedDispatcher> {
        let profile = ConnectionProfile::builder()
            .manager_url("http://manager.local")
            .credentials("admin", "secret")
            .build()
            .unwrap_or_else(|err| panic!("profile should build: {err}"));
        ManagerClient::new(profile, ScriptedDispatcher::new())
    }

    #[tokio::test]
    async fn publish_puts_archive_with_entry_file() {
        let client = client();
        client.dispatcher().push_response(201, "{}");
        let token = SessionToken::new("tok");

        client
            .publish_blueprint_bytes(&token, "web", Bytes::from_static(b"PK"), "main.yaml")
            .await
            .unwrap_or_else(|err| panic!("upload should succeed: {err}"));

        let requests = client.dispatcher().requests();
        let Some(request) = requests.first() else {
            panic!("expected upload request");
        };
        assert_eq!(request.method, Method::PUT);
        assert!(request.url.ends_with("/blueprints/web"), "url: {}", request.url);
        assert_eq!(request.query_param("application_file"), Some("main.yaml"));
        assert_eq!(request.header("Content-Type"), Some("application/zip"));
        assert_eq!(request.body, RequestBody::Raw(Bytes::from_static(b"PK")));
    }

    #[tokio::test]
    async fn publish_surfaces_rejection() {
        let client = client();
        client.dispatcher().push_response(400, "invalid blueprint");
        let token = SessionToken::new("tok");

        let err = client
            .publish_blueprint_bytes(&token, "web", Bytes::new(), "blueprint.yaml")
            .await
            .expect_err("400 should fail");
        assert_eq!(
            err,
            ApiError::Upload {
                status: 400,
                body: String::from("invalid blueprint"),
            }
        );
    }

    #[tokio::test]
    async fn publish_reports_unreadable_archive() {
        let client = client();
        let token = SessionToken::new("tok");

        let err = client
            .publish_blueprint(
                &token,
                "web",
                Utf8Path::new("/nonexistent/cfy-deploy/web.zip"),
                "blueprint.yaml",
            )
            .await
            .expect_err("missing archive should fail");
        assert!(matches!(err, ApiError::ArchiveRead { .. }), "unexpected: {err}");
        assert_eq!(client.dispatcher().request_count(), 0);
    }
}
