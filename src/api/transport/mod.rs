//! HTTP transport with bounded linear retry.
//!
//! A single HTTP exchange is abstracted behind [`Dispatch`] so the retry loop
//! can be exercised without a network. [`ReqwestDispatcher`] is the
//! production implementation.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use reqwest::Method;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

use super::error::ApiError;
use super::profile::{ConnectionProfile, RetryPolicy};

/// Username/password pair sent as HTTP basic authentication.
#[derive(Clone, Eq, PartialEq)]
pub struct BasicCredentials {
    /// Login name.
    pub username: String,
    /// Login secret.
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Payload attached to a request.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON document.
    Json(Value),
    /// Opaque bytes, for example an archive upload.
    Raw(Bytes),
}

/// Fully resolved request handed to a [`Dispatch`] implementation.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// Basic authentication, when the call requires it.
    pub basic_auth: Option<BasicCredentials>,
    /// Request payload.
    pub body: RequestBody,
}

impl ApiRequest {
    /// Returns the value of the named header, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the value of the named query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Status and body text from a single HTTP exchange.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub text: String,
}

/// Transient failure of a single attempt; always eligible for retry.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AttemptError {
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The request exceeded the per-request timeout.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// Any other request failure.
    #[error("request error: {0}")]
    Request(String),
}

/// Future returned by [`Dispatch::dispatch`].
pub type DispatchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<RawResponse, AttemptError>> + Send + 'a>>;

/// Performs exactly one HTTP exchange.
pub trait Dispatch: Send + Sync {
    /// Sends the request once and returns whatever the server answered.
    fn dispatch<'a>(&'a self, request: &'a ApiRequest) -> DispatchFuture<'a>;
}

/// [`Dispatch`] implementation backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestDispatcher {
    client: reqwest::Client,
}

impl ReqwestDispatcher {
    /// Builds a client honouring the profile's timeout and TLS settings.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] when the TLS backend cannot be
    /// initialised.
    pub fn new(profile: &ConnectionProfile) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(profile.request_timeout)
            .danger_accept_invalid_certs(profile.insecure)
            .build()
            .map_err(|err| ApiError::Client {
                message: err.to_string(),
            })?;
        Ok(Self { client })
    }

    fn classify(err: &reqwest::Error) -> AttemptError {
        if err.is_timeout() {
            AttemptError::Timeout(err.to_string())
        } else if err.is_connect() {
            AttemptError::Connect(err.to_string())
        } else {
            AttemptError::Request(err.to_string())
        }
    }
}

impl Dispatch for ReqwestDispatcher {
    fn dispatch<'a>(&'a self, request: &'a ApiRequest) -> DispatchFuture<'a> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method.clone(), request.url.as_str());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            if let Some(credentials) = &request.basic_auth {
                builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
            }
            builder = match &request.body {
                RequestBody::Empty => builder,
                RequestBody::Json(value) => builder.json(value),
                RequestBody::Raw(bytes) => builder.body(bytes.clone()),
            };

            let response = builder.send().await.map_err(|err| Self::classify(&err))?;
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|err| Self::classify(&err))?;
            Ok(RawResponse { status, text })
        })
    }
}

/// Response returned to callers once the transport settles.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response text.
    pub text: String,
    /// Body parsed as a JSON object; empty when the body is empty, not JSON,
    /// or not an object.
    pub body: Map<String, Value>,
}

impl ApiResponse {
    /// Wraps a raw response, parsing the body opportunistically.
    #[must_use]
    pub fn new(status: u16, text: String) -> Self {
        let body = if text.trim().is_empty() {
            Map::new()
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            }
        };
        Self { status, text, body }
    }

    /// True for 4xx and 5xx statuses.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// True for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns the named top-level field when it is a string.
    ///
    /// Fields are read one at a time, so a field of an unexpected type does
    /// not hide its siblings.
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.body.get(name).and_then(Value::as_str)
    }
}

/// Retrying wrapper around a [`Dispatch`] implementation.
#[derive(Clone, Debug)]
pub struct Transport<D> {
    dispatcher: D,
    retry: RetryPolicy,
}

impl<D: Dispatch> Transport<D> {
    /// Creates a transport using the given dispatcher and policy.
    #[must_use]
    pub const fn new(dispatcher: D, retry: RetryPolicy) -> Self {
        Self { dispatcher, retry }
    }

    /// Returns the underlying dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Sends the request, retrying 5xx responses and attempt failures.
    ///
    /// After failed attempt `k` the transport sleeps `backoff * k` before
    /// attempt `k + 1`. Responses below 500 are returned as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] once every attempt has failed.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let attempts = self.retry.attempts();
        let mut cause = String::new();

        for attempt in 1..=attempts {
            match self.dispatcher.dispatch(request).await {
                Ok(raw) if raw.status >= 500 => {
                    cause = format!("HTTP {}: {}", raw.status, raw.text);
                }
                Ok(raw) => return Ok(ApiResponse::new(raw.status, raw.text)),
                Err(err) => cause = err.to_string(),
            }

            if attempt < attempts {
                warn!(
                    attempt,
                    attempts,
                    method = %request.method,
                    url = %request.url,
                    cause = %cause,
                    "transient failure, retrying"
                );
                sleep(self.retry.delay_after(attempt)).await;
            }
        }

        Err(ApiError::Transport {
            method: request.method.to_string(),
            url: request.url.clone(),
            attempts,
            cause,
        })
    }
}
