//! Manager client: resolves calls against the connection profile.

use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;

use super::error::ApiError;
use super::profile::ConnectionProfile;
use super::session::SessionToken;
use super::transport::{
    ApiRequest, ApiResponse, BasicCredentials, Dispatch, ReqwestDispatcher, RequestBody,
    Transport,
};

/// Header carrying the tenant scope.
pub const TENANT_HEADER: &str = "Tenant";
/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "Authentication-Token";
/// Content type for JSON payloads.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type for blueprint archives.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Description of a single manager call, relative to the API root.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiCall<'a> {
    method: Method,
    path: String,
    token: Option<&'a SessionToken>,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    basic_auth: Option<BasicCredentials>,
    body: RequestBody,
    content_type: Option<&'static str>,
}

impl<'a> ApiCall<'a> {
    /// Starts a call for `method` on the resource `path`.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            token: None,
            headers: Vec::new(),
            query: Vec::new(),
            basic_auth: None,
            body: RequestBody::Empty,
            content_type: None,
        }
    }

    /// Authenticates the call with a session token.
    #[must_use]
    pub const fn token(mut self, token: &'a SessionToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Adds an explicit header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Sends basic authentication with the call.
    #[must_use]
    pub fn basic_auth(mut self, credentials: BasicCredentials) -> Self {
        self.basic_auth = Some(credentials);
        self
    }

    /// Attaches a JSON body and the JSON content type.
    #[must_use]
    pub fn json(mut self, value: Value) -> Self {
        self.body = RequestBody::Json(value);
        self.content_type = Some(JSON_CONTENT_TYPE);
        self
    }

    /// Attaches raw bytes with the given content type.
    #[must_use]
    pub fn raw(mut self, bytes: Bytes, content_type: &'static str) -> Self {
        self.body = RequestBody::Raw(bytes);
        self.content_type = Some(content_type);
        self
    }
}

/// Client bound to one connection profile for the duration of a run.
#[derive(Clone, Debug)]
pub struct ManagerClient<D> {
    profile: ConnectionProfile,
    transport: Transport<D>,
}

impl ManagerClient<ReqwestDispatcher> {
    /// Creates a client that talks HTTP through `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] when the HTTP client cannot be built.
    pub fn connect(profile: ConnectionProfile) -> Result<Self, ApiError> {
        let dispatcher = ReqwestDispatcher::new(&profile)?;
        Ok(Self::new(profile, dispatcher))
    }
}

impl<D: Dispatch> ManagerClient<D> {
    /// Creates a client using an explicit dispatcher.
    #[must_use]
    pub fn new(profile: ConnectionProfile, dispatcher: D) -> Self {
        let transport = Transport::new(dispatcher, profile.retry);
        Self { profile, transport }
    }

    /// Returns the connection profile.
    #[must_use]
    pub const fn profile(&self) -> &ConnectionProfile {
        &self.profile
    }

    /// Returns the underlying dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &D {
        self.transport.dispatcher()
    }

    /// Resolves a call into an absolute request.
    ///
    /// The tenant header is added when a tenant is configured and the call
    /// did not set one; the token and content type headers follow.
    #[must_use]
    pub fn prepare(&self, call: ApiCall<'_>) -> ApiRequest {
        let mut request = ApiRequest {
            method: call.method,
            url: self.profile.api_url(&call.path),
            headers: call.headers,
            query: call.query,
            basic_auth: call.basic_auth,
            body: call.body,
        };

        if let Some(tenant) = &self.profile.tenant {
            if request.header(TENANT_HEADER).is_none() {
                request
                    .headers
                    .push((TENANT_HEADER.to_owned(), tenant.clone()));
            }
        }
        if let Some(token) = call.token {
            request
                .headers
                .push((TOKEN_HEADER.to_owned(), token.as_str().to_owned()));
        }
        if let Some(content_type) = call.content_type {
            request
                .headers
                .push((String::from("Content-Type"), content_type.to_owned()));
        }
        request
    }

    /// Resolves and sends a call through the retrying transport.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] when the retry budget is exhausted.
    pub async fn call(&self, call: ApiCall<'_>) -> Result<ApiResponse, ApiError> {
        let request = self.prepare(call);
        self.transport.send(&request).await
    }
}
