//! Plain HTTP client facade

use std::future::Future;
use std::sync::Arc;

use crate::body::Body;
use crate::connection::{http_request, Connection, ConnectionAdapter};
use crate::error::Error;
use crate::method::RequestMethod;
use crate::options::RequestOptions;
use crate::request::Request;
use crate::response::Response;

/// First argument of [`HttpExt::request`]: a URL or an already prepared request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestTarget {
    /// Resolve options against this URL
    Url(String),
    /// Dispatch as-is
    Request(Request),
}

impl From<&str> for RequestTarget {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for RequestTarget {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<&String> for RequestTarget {
    fn from(url: &String) -> Self {
        Self::Url(url.clone())
    }
}

impl From<Request> for RequestTarget {
    fn from(request: Request) -> Self {
        Self::Request(request)
    }
}

/// Resolve the configuration of one call.
///
/// The call layer forces `method` and takes the URL from `options` when it
/// carries a non-empty one, else `url`. The result is `defaults` merged with
/// that layer.
pub fn merge_call_options(
    defaults: &RequestOptions,
    options: Option<&RequestOptions>,
    method: RequestMethod,
    url: &str,
) -> RequestOptions {
    let call = match options {
        Some(options) => {
            let url = options
                .url
                .clone()
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| url.to_string());
            RequestOptions {
                method: Some(method),
                url: Some(url),
                ..options.clone()
            }
        }
        None => RequestOptions::new().method(method).url(url),
    };
    defaults.merge(Some(&call))
}

/// Resolve a verb call into a request. `body` is layered onto `defaults`
/// before the call options.
pub fn prepare_verb(
    defaults: &RequestOptions,
    method: RequestMethod,
    url: &str,
    body: Option<Body>,
    options: Option<&RequestOptions>,
) -> Result<Request, Error> {
    let merged = match body {
        Some(body) => {
            let base = defaults.merge(Some(&RequestOptions::new().body(body)));
            merge_call_options(&base, options, method, url)
        }
        None => merge_call_options(defaults, options, method, url),
    };
    Request::from_options(&merged)
}

/// Verb surface shared by the client facades
///
/// Implementors provide the client defaults and the dispatch of a resolved
/// request. Every provided method resolves and validates its request before
/// returning, so call-site misuse is reported by the returned future without
/// any dispatch or handler activity.
pub trait HttpExt: Send + Sync {
    /// Client-level default configuration
    fn defaults(&self) -> &RequestOptions;

    /// Dispatch a resolved request
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, Error>> + Send;

    /// Resolve `target` and `options` into a request without sending it.
    ///
    /// A prepared [`Request`] is returned unchanged and `options` is ignored.
    /// For a URL the method is the one in `options`, else the default method,
    /// else GET.
    fn prepare(
        &self,
        target: impl Into<RequestTarget>,
        options: Option<&RequestOptions>,
    ) -> Result<Request, Error> {
        match target.into() {
            RequestTarget::Request(request) => Ok(request),
            RequestTarget::Url(url) => {
                let method = options
                    .and_then(|options| options.method)
                    .or(self.defaults().method)
                    .unwrap_or_default();
                let merged = merge_call_options(self.defaults(), options, method, &url);
                Request::from_options(&merged)
            }
        }
    }

    /// Common entry point
    fn request(
        &self,
        target: impl Into<RequestTarget>,
        options: Option<RequestOptions>,
    ) -> impl Future<Output = Result<Response, Error>> + Send {
        let dispatch = self
            .prepare(target, options.as_ref())
            .map(|request| self.send(request));
        async move { dispatch?.await }
    }

    /// Send a GET request
    fn get(
        &self,
        url: &str,
        options: Option<RequestOptions>,
    ) -> impl Future<Output = Result<Response, Error>> + Send {
        let dispatch = prepare_verb(
            self.defaults(),
            RequestMethod::Get,
            url,
            None,
            options.as_ref(),
        )
        .map(|request| self.send(request));
        async move { dispatch?.await }
    }

    /// Send a POST request with `body`
    fn post(
        &self,
        url: &str,
        body: impl Into<Body>,
        options: Option<RequestOptions>,
    ) -> impl Future<Output = Result<Response, Error>> + Send {
        let dispatch = prepare_verb(
            self.defaults(),
            RequestMethod::Post,
            url,
            Some(body.into()),
            options.as_ref(),
        )
        .map(|request| self.send(request));
        async move { dispatch?.await }
    }

    /// Send a PUT request with `body`
    fn put(
        &self,
        url: &str,
        body: impl Into<Body>,
        options: Option<RequestOptions>,
    ) -> impl Future<Output = Result<Response, Error>> + Send {
        let dispatch = prepare_verb(
            self.defaults(),
            RequestMethod::Put,
            url,
            Some(body.into()),
            options.as_ref(),
        )
        .map(|request| self.send(request));
        async move { dispatch?.await }
    }

    /// Send a DELETE request
    fn delete(
        &self,
        url: &str,
        options: Option<RequestOptions>,
    ) -> impl Future<Output = Result<Response, Error>> + Send {
        let dispatch = prepare_verb(
            self.defaults(),
            RequestMethod::Delete,
            url,
            None,
            options.as_ref(),
        )
        .map(|request| self.send(request));
        async move { dispatch?.await }
    }

    /// Send a PATCH request with `body`
    fn patch(
        &self,
        url: &str,
        body: impl Into<Body>,
        options: Option<RequestOptions>,
    ) -> impl Future<Output = Result<Response, Error>> + Send {
        let dispatch = prepare_verb(
            self.defaults(),
            RequestMethod::Patch,
            url,
            Some(body.into()),
            options.as_ref(),
        )
        .map(|request| self.send(request));
        async move { dispatch?.await }
    }

    /// Send a HEAD request
    fn head(
        &self,
        url: &str,
        options: Option<RequestOptions>,
    ) -> impl Future<Output = Result<Response, Error>> + Send {
        let dispatch = prepare_verb(
            self.defaults(),
            RequestMethod::Head,
            url,
            None,
            options.as_ref(),
        )
        .map(|request| self.send(request));
        async move { dispatch?.await }
    }

    /// Send an OPTIONS request
    fn options(
        &self,
        url: &str,
        options: Option<RequestOptions>,
    ) -> impl Future<Output = Result<Response, Error>> + Send {
        let dispatch = prepare_verb(
            self.defaults(),
            RequestMethod::Options,
            url,
            None,
            options.as_ref(),
        )
        .map(|request| self.send(request));
        async move { dispatch?.await }
    }
}

/// HTTP client bound to one transport adapter
#[derive(Debug, Clone)]
pub struct Http {
    defaults: RequestOptions,
    adapter: Arc<dyn ConnectionAdapter>,
}

#[cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]
impl Default for Http {
    fn default() -> Self {
        Self::new(crate::backends::ReqwestAdapter::new())
    }
}

impl Http {
    /// Create a client without defaults
    pub fn new(adapter: impl ConnectionAdapter + 'static) -> Self {
        Self::with_defaults(RequestOptions::default(), adapter)
    }

    /// Create a client with client-level defaults
    pub fn with_defaults(defaults: RequestOptions, adapter: impl ConnectionAdapter + 'static) -> Self {
        Self::from_arc(defaults, Arc::new(adapter))
    }

    /// Create a client sharing an adapter with other clients
    pub fn from_arc(defaults: RequestOptions, adapter: Arc<dyn ConnectionAdapter>) -> Self {
        Self { defaults, adapter }
    }

    /// The bound adapter
    pub fn adapter(&self) -> &Arc<dyn ConnectionAdapter> {
        &self.adapter
    }

    /// Open a connection to observe its progress before awaiting the response
    pub fn connect(&self, request: Request) -> Connection {
        Connection::open(self.adapter.clone(), request)
    }
}

#[allow(clippy::manual_async_fn)]
impl HttpExt for Http {
    fn defaults(&self) -> &RequestOptions {
        &self.defaults
    }

    fn send(&self, request: Request) -> impl Future<Output = Result<Response, Error>> + Send {
        http_request(&self.adapter, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyReader;

    #[test]
    fn test_call_layer_forces_method_and_url() {
        let defaults = RequestOptions::new()
            .method(RequestMethod::Put)
            .header("X-Default", "1");
        let options = RequestOptions::new()
            .method(RequestMethod::Delete)
            .header("X-Call", "2");

        let merged = merge_call_options(&defaults, Some(&options), RequestMethod::Get, "https://a.b");
        assert_eq!(merged.method, Some(RequestMethod::Get));
        assert_eq!(merged.url.as_deref(), Some("https://a.b"));
        let headers = merged.headers.unwrap_or_default();
        assert_eq!(headers.get("x-default"), Some("1"));
        assert_eq!(headers.get("x-call"), Some("2"));
    }

    #[test]
    fn test_call_layer_prefers_non_empty_option_url() {
        let defaults = RequestOptions::new();
        let options = RequestOptions::new().url("https://other");
        let merged = merge_call_options(&defaults, Some(&options), RequestMethod::Get, "https://a.b");
        assert_eq!(merged.url.as_deref(), Some("https://other"));

        let options = RequestOptions::new().url("");
        let merged = merge_call_options(&defaults, Some(&options), RequestMethod::Get, "https://a.b");
        assert_eq!(merged.url.as_deref(), Some("https://a.b"));
    }

    #[test]
    fn test_verb_body_sits_below_call_options() {
        let defaults = RequestOptions::new().body("default");
        let request = prepare_verb(
            &defaults,
            RequestMethod::Post,
            "https://a.b",
            Some(Body::from("verb")),
            None,
        )
        .expect("request");
        assert_eq!(request.method(), RequestMethod::Post);
        assert_eq!(request.raw_body(), Some(&Body::from("verb")));

        let options = RequestOptions::new().body("call");
        let request = prepare_verb(
            &defaults,
            RequestMethod::Post,
            "https://a.b",
            Some(Body::from("verb")),
            Some(&options),
        )
        .expect("request");
        assert_eq!(request.raw_body(), Some(&Body::from("call")));
    }

    #[test]
    fn test_empty_url_is_invalid_argument() {
        let result = prepare_verb(&RequestOptions::new(), RequestMethod::Get, "", None, None);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_target_conversions() {
        assert_eq!(
            RequestTarget::from("https://a.b"),
            RequestTarget::Url("https://a.b".to_string())
        );
        let request = Request::new(RequestMethod::Head, "https://a.b");
        assert_eq!(
            RequestTarget::from(request.clone()),
            RequestTarget::Request(request)
        );
    }
}
