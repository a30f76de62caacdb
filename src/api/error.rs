//! Error taxonomy for manager API calls.

use thiserror::Error;

/// Errors raised while talking to the manager.
///
/// Every stage of the pipeline maps its failures onto one variant so callers
/// can tell an unreachable manager apart from a rejected request or a failed
/// workflow.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// Raised when the HTTP client cannot be constructed.
    #[error("failed to build HTTP client: {message}")]
    Client {
        /// Message returned by the HTTP library.
        message: String,
    },
    /// Raised when the retry budget is exhausted on transient failures.
    #[error("request failed after {attempts} attempts: {method} {url}: {cause}")]
    Transport {
        /// HTTP method of the failed request.
        method: String,
        /// Absolute URL of the failed request.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// Description of the last failure.
        cause: String,
    },
    /// Raised when the manager rejects the credentials.
    #[error("authentication failed (HTTP {status}): {body}")]
    Authentication {
        /// HTTP status returned by the manager.
        status: u16,
        /// Response text.
        body: String,
    },
    /// Raised when the token response does not carry a token.
    #[error("token not found in response: {body}")]
    MissingToken {
        /// Response text.
        body: String,
    },
    /// Raised when the blueprint archive cannot be read from disk.
    #[error("failed to read blueprint archive {path}: {message}")]
    ArchiveRead {
        /// Archive location.
        path: String,
        /// I/O error message.
        message: String,
    },
    /// Raised when the manager rejects a blueprint upload.
    #[error("blueprint upload failed (HTTP {status}): {body}")]
    Upload {
        /// HTTP status returned by the manager.
        status: u16,
        /// Response text.
        body: String,
    },
    /// Raised when the deployment lookup fails for a reason other than 404.
    #[error("failed to check deployment {deployment_id} (HTTP {status})")]
    ExistenceCheck {
        /// Deployment being looked up.
        deployment_id: String,
        /// HTTP status returned by the manager.
        status: u16,
    },
    /// Raised when the manager rejects a deployment creation.
    #[error("deployment create failed (HTTP {status}): {body}")]
    Creation {
        /// HTTP status returned by the manager.
        status: u16,
        /// Response text.
        body: String,
    },
    /// Raised when the manager rejects a workflow start.
    #[error("start execution failed (HTTP {status}): {body}")]
    StartExecution {
        /// HTTP status returned by the manager.
        status: u16,
        /// Response text.
        body: String,
    },
    /// Raised when a successful start response carries no execution id.
    #[error("execution id missing in response: {body}")]
    MissingExecutionId {
        /// Response text.
        body: String,
    },
    /// Raised when an execution status read is rejected.
    #[error("failed to read execution {execution_id} (HTTP {status}): {body}")]
    ReadExecution {
        /// Execution being polled.
        execution_id: String,
        /// HTTP status returned by the manager.
        status: u16,
        /// Response text.
        body: String,
    },
    /// Raised when the execution reaches a failure-terminal status.
    #[error("execution {execution_id} ended with status '{status}': {body}")]
    ExecutionFailed {
        /// Execution that failed.
        execution_id: String,
        /// Terminal status reported by the manager.
        status: String,
        /// Last response text.
        body: String,
    },
    /// Raised when the execution does not finish before the deadline.
    #[error("timed out waiting for execution {execution_id}; last status: {last_status}")]
    Timeout {
        /// Execution being polled.
        execution_id: String,
        /// Last status observed before giving up.
        last_status: String,
    },
}
