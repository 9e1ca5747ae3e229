//! Layered request configuration
//!
//! Client defaults, interceptor defaults and per-call overrides are all
//! [`RequestOptions`]. [`RequestOptions::merge`] combines two layers into a new
//! one: a field set on the override wins, headers accumulate and query
//! parameters are replaced as a whole.

use std::time::Duration;

use serde_json::Value;

use crate::body::Body;
use crate::headers::Headers;
use crate::method::RequestMethod;
use crate::request::ResponseContentType;
use crate::search_params::SearchParams;

/// Settings only meaningful to the interceptor client
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterceptorOptions {
    /// `Some(false)` lets handlers run without waiting for a held lock
    pub wait_lock: Option<bool>,
    /// `Some(true)` bypasses every registered handler
    pub skip_interceptor: Option<bool>,
    /// Opaque data carried through to handlers
    pub extra: Option<Value>,
}

impl InterceptorOptions {
    /// Combine with an override layer; fields set on `other` win
    pub fn merge(&self, other: Option<&InterceptorOptions>) -> InterceptorOptions {
        let Some(other) = other else {
            return self.clone();
        };
        InterceptorOptions {
            wait_lock: other.wait_lock.or(self.wait_lock),
            skip_interceptor: other.skip_interceptor.or(self.skip_interceptor),
            extra: other.extra.clone().or_else(|| self.extra.clone()),
        }
    }
}

/// One configuration layer; every field is optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// HTTP method
    pub method: Option<RequestMethod>,
    /// Headers
    pub headers: Option<Headers>,
    /// Body
    pub body: Option<Body>,
    /// Target URL
    pub url: Option<String>,
    /// Query parameters
    pub params: Option<SearchParams>,
    /// Send credentials on cross-site requests
    pub with_credentials: Option<bool>,
    /// Response type hint
    pub response_type: Option<ResponseContentType>,
    /// Abort the transport call after this long
    pub timeout: Option<Duration>,
    /// Interceptor settings
    pub interceptor: Option<InterceptorOptions>,
}

impl RequestOptions {
    /// Empty layer
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the method
    pub fn method(mut self, method: RequestMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Append a header value
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .append(name, value);
        self
    }

    /// Replace the headers
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Set the body
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the query parameters
    pub fn params(mut self, params: impl Into<SearchParams>) -> Self {
        self.params = Some(params.into());
        self
    }

    /// Deprecated alias of [`RequestOptions::params`]
    pub fn search(self, params: impl Into<SearchParams>) -> Self {
        self.params(params)
    }

    /// Set the credentials flag
    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = Some(with_credentials);
        self
    }

    /// Set the response type hint
    pub fn response_type(mut self, response_type: ResponseContentType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Set the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the timeout in milliseconds
    pub fn timeout_ms(self, millis: u64) -> Self {
        self.timeout(Duration::from_millis(millis))
    }

    /// Whether handlers wait for a held interceptor lock
    pub fn wait_lock(mut self, wait_lock: bool) -> Self {
        self.interceptor
            .get_or_insert_with(InterceptorOptions::default)
            .wait_lock = Some(wait_lock);
        self
    }

    /// Whether registered handlers are bypassed
    pub fn skip_interceptor(mut self, skip: bool) -> Self {
        self.interceptor
            .get_or_insert_with(InterceptorOptions::default)
            .skip_interceptor = Some(skip);
        self
    }

    /// Attach opaque data for handlers
    pub fn extra(mut self, extra: Value) -> Self {
        self.interceptor
            .get_or_insert_with(InterceptorOptions::default)
            .extra = Some(extra);
        self
    }

    /// Combine this layer with an override, producing a new layer.
    ///
    /// Neither input is modified. Scalar fields set on `other` win. Headers
    /// start from this layer and receive every value of `other` on top, so
    /// same-named headers keep both values. Query parameters set on `other`
    /// replace this layer's parameters entirely.
    pub fn merge(&self, other: Option<&RequestOptions>) -> RequestOptions {
        let Some(other) = other else {
            return self.clone();
        };

        let headers = match (&self.headers, &other.headers) {
            (None, None) => None,
            (base, overrides) => {
                let mut merged = base.clone().unwrap_or_default();
                if let Some(overrides) = overrides {
                    merged.merge(overrides);
                }
                Some(merged)
            }
        };

        let interceptor = match (&self.interceptor, &other.interceptor) {
            (None, None) => None,
            (base, overrides) => Some(
                base.clone()
                    .unwrap_or_default()
                    .merge(overrides.as_ref()),
            ),
        };

        RequestOptions {
            method: other.method.or(self.method),
            headers,
            body: other.body.clone().or_else(|| self.body.clone()),
            url: other.url.clone().or_else(|| self.url.clone()),
            params: other.params.clone().or_else(|| self.params.clone()),
            with_credentials: other.with_credentials.or(self.with_credentials),
            response_type: other.response_type.or(self.response_type),
            timeout: other.timeout.or(self.timeout),
            interceptor,
        }
    }
}
