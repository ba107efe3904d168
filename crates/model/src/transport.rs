//! The HTTP collaborator contract.
//!
//! The model never talks to the network itself. It builds a [`Request`] and
//! hands it to an [`HttpClient`]; retries, timeouts and status policy belong
//! to the client.

use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::options::UpdateMethod;

/// A remote action a model can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read the resource
    Fetch,
    /// Create the resource
    Create,
    /// Update the resource
    Update,
    /// Delete the resource
    Destroy,
}

impl Action {
    /// Lowercase action name. Also used as the validation scope of a save.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Create => "create",
            Self::Update => "update",
            Self::Destroy => "destroy",
        }
    }

    /// HTTP method for this action.
    pub fn method(self, update: UpdateMethod) -> Method {
        match self {
            Self::Fetch => Method::GET,
            Self::Create => Method::POST,
            Self::Update => match update {
                UpdateMethod::Put => Method::PUT,
                UpdateMethod::Patch => Method::PATCH,
            },
            Self::Destroy => Method::DELETE,
        }
    }

    /// Whether the action sends the model's attributes.
    pub fn has_body(self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound request descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Fully resolved URL
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
    /// JSON body, if any
    pub body: Option<Value>,
    /// Whether to send credentials (cookies) with the request
    pub credentials: bool,
}

/// Response handed back by the collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Response status
    pub status: StatusCode,
    /// Decoded JSON body; `None` when the response had none
    pub data: Option<Value>,
    /// Response headers
    pub headers: HeaderMap,
}

impl Response {
    /// A response without body or headers.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            data: None,
            headers: HeaderMap::new(),
        }
    }

    /// `200 OK` with a JSON body.
    pub fn ok(data: Value) -> Self {
        Self::new(StatusCode::OK).with_data(data)
    }

    /// `204 No Content`.
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// Sets the body.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Sends requests on behalf of a model.
///
/// Implementations decide which statuses are failures. Whatever error they
/// return reaches the model's caller unchanged.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends one request.
    async fn send(&self, request: Request) -> Result<Response, BoxError>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn send(&self, request: Request) -> Result<Response, BoxError> {
        (**self).send(request).await
    }
}
