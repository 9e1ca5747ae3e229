//! Canonical request

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::body::{Body, BodyReader, ContentType, RenderedBody};
use crate::error::Error;
use crate::headers::Headers;
use crate::method::RequestMethod;
use crate::options::{InterceptorOptions, RequestOptions};
use crate::search_params::SearchParams;

/// Requested shape of the response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseContentType {
    /// Text
    Text,
    /// Parsed JSON
    Json,
    /// Raw bytes
    #[serde(rename = "arraybuffer")]
    ArrayBuffer,
    /// Blob carrying the response MIME type
    Blob,
}

/// Append serialized `params` to `url`, using `?` for the first query string,
/// `&` afterwards and nothing when the URL already ends in `&`.
pub fn build_url(url: &str, params: Option<&SearchParams>) -> String {
    let query = match params {
        Some(params) => params.to_string(),
        None => return url.to_string(),
    };
    if query.is_empty() {
        return url.to_string();
    }
    let prefix = if !url.contains('?') {
        "?"
    } else if url.ends_with('&') {
        ""
    } else {
        "&"
    };
    format!("{url}{prefix}{query}")
}

/// Classify a body from the `Content-Type` header, falling back to its shape
pub fn detect_content_type(headers: &Headers, body: Option<&Body>) -> ContentType {
    match headers.get("content-type") {
        Some("application/json") => ContentType::Json,
        Some("application/x-www-form-urlencoded") => ContentType::Form,
        Some("multipart/form-data") => ContentType::FormData,
        Some("text/plain") | Some("text/html") => ContentType::Text,
        Some("application/octet-stream") => match body {
            Some(Body::Bytes(_)) => ContentType::ArrayBuffer,
            _ => ContentType::Blob,
        },
        _ => body.map(Body::content_type).unwrap_or_default(),
    }
}

/// A fully resolved request, consumed by exactly one dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: RequestMethod,
    url: String,
    headers: Headers,
    body: Option<Body>,
    content_type: ContentType,
    with_credentials: Option<bool>,
    response_type: Option<ResponseContentType>,
    timeout: Option<Duration>,
    interceptor: Option<InterceptorOptions>,
}

impl Request {
    /// Create a request without body or headers
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
            content_type: ContentType::None,
            with_credentials: None,
            response_type: None,
            timeout: None,
            interceptor: None,
        }
    }

    /// Build a request from a resolved configuration.
    ///
    /// The configuration must carry a URL; query parameters are serialized into it.
    pub fn from_options(options: &RequestOptions) -> Result<Self, Error> {
        let url = match options.url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => {
                return Err(Error::InvalidArgument(
                    "First argument must be a url string or Request instance.".to_string(),
                ))
            }
        };
        let headers = options.headers.clone().unwrap_or_default();
        let content_type = detect_content_type(&headers, options.body.as_ref());

        Ok(Self {
            method: options.method.unwrap_or_default(),
            url: build_url(url, options.params.as_ref()),
            headers,
            body: options.body.clone(),
            content_type,
            with_credentials: options.with_credentials,
            response_type: options.response_type,
            timeout: options.timeout,
            interceptor: options.interceptor.clone(),
        })
    }

    /// HTTP method
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// URL with the query string already applied
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Content type tag derived from the headers and body
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Whether cross-site requests should carry credentials
    pub fn with_credentials(&self) -> Option<bool> {
        self.with_credentials
    }

    /// Response type hint
    pub fn response_type(&self) -> Option<ResponseContentType> {
        self.response_type
    }

    /// Timeout after which the transport call is aborted
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Interceptor settings, present on requests built by the interceptor client
    pub fn interceptor_options(&self) -> Option<&InterceptorOptions> {
        self.interceptor.as_ref()
    }

    /// Replace the body, re-deriving the content type
    pub fn set_body(&mut self, body: Option<Body>) {
        self.body = body;
        self.content_type = detect_content_type(&self.headers, self.body.as_ref());
    }

    /// Set a header, re-deriving the content type
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.set(name, value);
        self.content_type = detect_content_type(&self.headers, self.body.as_ref());
    }

    /// Append a header value, re-deriving the content type
    pub fn append_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.append(name, value);
        self.content_type = detect_content_type(&self.headers, self.body.as_ref());
    }

    /// Builder form of [`Request::set_header`]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Builder form of [`Request::set_body`]
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.set_body(Some(body.into()));
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the response type hint
    pub fn with_response_type(mut self, response_type: ResponseContentType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Attach interceptor settings
    pub fn with_interceptor_options(mut self, options: InterceptorOptions) -> Self {
        self.interceptor = Some(options);
        self
    }

    /// Render the body into the wire representation selected by the content type
    pub fn get_body(&self) -> Result<RenderedBody, Error> {
        match self.content_type {
            ContentType::None => Ok(RenderedBody::Empty),
            ContentType::Json | ContentType::Form | ContentType::Text => match &self.body {
                Some(Body::Bytes(bytes)) => Ok(RenderedBody::Bytes(bytes.clone())),
                Some(Body::Blob(blob)) => Ok(RenderedBody::Bytes(blob.bytes().to_vec())),
                _ => Ok(RenderedBody::Text(self.text()?)),
            },
            ContentType::FormData => match &self.body {
                Some(Body::FormData(form)) => Ok(RenderedBody::FormData(form.clone())),
                _ => Err(Error::InvalidBody(
                    "multipart/form-data requires a form data body".to_string(),
                )),
            },
            ContentType::Blob => Ok(RenderedBody::Blob(self.blob()?)),
            ContentType::ArrayBuffer => Ok(RenderedBody::Bytes(self.array_buffer()?)),
        }
    }

    /// Wrap into the shared form used as a response back-reference
    pub fn into_shared(self) -> Arc<Request> {
        Arc::new(self)
    }
}

impl BodyReader for Request {
    fn raw_body(&self) -> Option<&Body> {
        self.body.as_ref()
    }
}
