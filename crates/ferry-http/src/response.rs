//! Canonical response

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::body::{Body, BodyReader};
use crate::headers::Headers;
use crate::request::Request;

/// Origin classification of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response
    Basic,
    /// Cross-origin response
    Cors,
    /// Unclassified
    #[default]
    Default,
    /// Synthesized after a transport failure or timeout
    Error,
    /// Opaque cross-origin response
    Opaque,
}

/// Whether `status` is within 200-299
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Result of one transport attempt, successful or not
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    ok: bool,
    status_text: String,
    headers: Headers,
    response_type: ResponseType,
    url: String,
    duration: Option<Duration>,
    request: Option<Arc<Request>>,
    body: Option<Body>,
}

impl Response {
    /// HTTP status, `0` for synthesized error responses
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Whether the status is within 200-299
    pub fn ok(&self) -> bool {
        self.ok
    }

    /// Reason phrase or error description
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Response headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to the response headers
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Origin classification
    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    /// URL the response belongs to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Wall-clock time from dispatch start to settle
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// The request this response answers
    pub fn request(&self) -> Option<&Request> {
        self.request.as_deref()
    }

    /// Replace the body
    pub fn set_body(&mut self, body: Option<Body>) {
        self.body = body;
    }

    /// Take the body out of the response
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }
}

impl BodyReader for Response {
    fn raw_body(&self) -> Option<&Body> {
        self.body.as_ref()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Response with status: {} {} for URL: {}",
            self.status, self.status_text, self.url
        )
    }
}

/// Optional-field description of a response
#[derive(Debug, Clone, Default)]
pub struct ResponseOptions {
    body: Option<Body>,
    status: Option<u16>,
    status_text: Option<String>,
    headers: Option<Headers>,
    response_type: Option<ResponseType>,
    url: Option<String>,
    duration: Option<Duration>,
    request: Option<Arc<Request>>,
}

impl ResponseOptions {
    /// Empty description
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the body
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set or clear the body
    pub fn maybe_body(mut self, body: Option<Body>) -> Self {
        self.body = body;
        self
    }

    /// Set the status
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the status text
    pub fn status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = Some(status_text.into());
        self
    }

    /// Set the headers
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Set the response type
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Set the URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the duration
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Set the originating request
    pub fn request(mut self, request: Arc<Request>) -> Self {
        self.request = Some(request);
        self
    }

    /// Combine with an override; fields set on `other` win.
    ///
    /// The originating request is never taken from the override.
    pub fn merge(&self, other: Option<&ResponseOptions>) -> ResponseOptions {
        let Some(other) = other else {
            return self.clone();
        };
        ResponseOptions {
            body: other.body.clone().or_else(|| self.body.clone()),
            status: other.status.or(self.status),
            status_text: other
                .status_text
                .clone()
                .or_else(|| self.status_text.clone()),
            headers: other.headers.clone().or_else(|| self.headers.clone()),
            response_type: other.response_type.or(self.response_type),
            url: other.url.clone().or_else(|| self.url.clone()),
            duration: other.duration.or(self.duration),
            request: self.request.clone(),
        }
    }

    /// Build the response. Status defaults to 200 and status text to "OK".
    pub fn build(self) -> Response {
        let status = self.status.unwrap_or(200);
        Response {
            status,
            ok: is_success(status),
            status_text: self.status_text.unwrap_or_else(|| "OK".to_string()),
            headers: self.headers.unwrap_or_default(),
            response_type: self.response_type.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            duration: self.duration,
            request: self.request,
            body: self.body,
        }
    }
}
