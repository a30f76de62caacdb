//! Client for the orchestration manager's REST control plane.
//!
//! Every call is resolved against one immutable [`ConnectionProfile`] and
//! sent through the retrying [`Transport`]. The individual stages live in
//! their own modules as `impl` blocks on [`ManagerClient`]:
//!
//! - `session`: `POST /tokens`
//! - `blueprint`: `PUT /blueprints/{id}`
//! - `deployment`: `GET`/`PUT /deployments/{id}`
//! - `execution`: `POST /executions`, `GET /executions/{id}`

mod blueprint;
mod client;
mod deployment;
mod error;
mod execution;
mod profile;
mod session;
mod transport;

pub use client::{
    ARCHIVE_CONTENT_TYPE, ApiCall, JSON_CONTENT_TYPE, ManagerClient, TENANT_HEADER, TOKEN_HEADER,
};
pub use error::ApiError;
pub use execution::{ExecutionHandle, StatusClass, StatusVocabulary};
pub use profile::{
    ConnectionProfile, ConnectionProfileBuilder, DEFAULT_API_VERSION, DEFAULT_EXEC_TIMEOUT,
    DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BACKOFF,
    ProfileError, RetryPolicy,
};
pub use session::SessionToken;
pub use transport::{
    ApiRequest, ApiResponse, AttemptError, BasicCredentials, Dispatch, DispatchFuture, RawResponse,
    ReqwestDispatcher, RequestBody, Transport,
};
