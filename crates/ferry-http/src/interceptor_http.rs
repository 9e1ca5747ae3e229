//! HTTP client with request and response interceptors

use std::future::Future;
use std::sync::Arc;

use crate::client::{Http, HttpExt};
use crate::connection::{Connection, ConnectionAdapter};
use crate::error::Error;
use crate::interceptor::Interceptor;
use crate::options::{InterceptorOptions, RequestOptions};
use crate::request::Request;
use crate::response::Response;

/// Request and response handler lists of one client
#[derive(Debug, Clone, Default)]
pub struct Interceptors {
    /// Run in order before dispatch
    pub request: Interceptor<Request>,
    /// Run in order after the exchange settles
    pub response: Interceptor<Response>,
}

/// [`Http`] with interceptors around every dispatch
///
/// Each call captures the live handlers when it is issued, then threads its
/// request through the request handlers, the transport and the response
/// handlers in that order. Handlers registered or ejected afterwards do not
/// affect calls already issued.
#[derive(Debug, Clone)]
pub struct InterceptorHttp {
    http: Http,
    /// Handler lists, shared by clones of this client
    pub interceptors: Interceptors,
}

#[cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]
impl Default for InterceptorHttp {
    fn default() -> Self {
        Self::from_http(Http::default())
    }
}

impl InterceptorHttp {
    /// Create a client without defaults
    pub fn new(adapter: impl ConnectionAdapter + 'static) -> Self {
        Self::from_http(Http::new(adapter))
    }

    /// Create a client with client-level defaults, including interceptor defaults
    pub fn with_defaults(defaults: RequestOptions, adapter: impl ConnectionAdapter + 'static) -> Self {
        Self::from_http(Http::with_defaults(defaults, adapter))
    }

    /// Create a client sharing an adapter with other clients
    pub fn from_arc(defaults: RequestOptions, adapter: Arc<dyn ConnectionAdapter>) -> Self {
        Self::from_http(Http::from_arc(defaults, adapter))
    }

    /// Wrap a plain client
    pub fn from_http(http: Http) -> Self {
        Self {
            http,
            interceptors: Interceptors::default(),
        }
    }

    /// The bound adapter
    pub fn adapter(&self) -> &Arc<dyn ConnectionAdapter> {
        self.http.adapter()
    }

    /// Open a connection directly, bypassing every handler
    pub fn connect(&self, request: Request) -> Connection {
        self.http.connect(request)
    }

    /// Client defaults overlaid with the request's own interceptor settings
    fn effective_options(&self, request: &Request) -> InterceptorOptions {
        self.http
            .defaults()
            .interceptor
            .clone()
            .unwrap_or_default()
            .merge(request.interceptor_options())
    }
}

impl HttpExt for InterceptorHttp {
    fn defaults(&self) -> &RequestOptions {
        self.http.defaults()
    }

    fn send(&self, request: Request) -> impl Future<Output = Result<Response, Error>> + Send {
        let options = self.effective_options(&request);
        let wait_lock = options.wait_lock != Some(false);
        let (request_handlers, response_handlers) = if options.skip_interceptor == Some(true) {
            tracing::trace!("Skipping interceptors for {} {}", request.method(), request.url());
            (Vec::new(), Vec::new())
        } else {
            (
                self.interceptors.request.snapshot(),
                self.interceptors.response.snapshot(),
            )
        };

        async move {
            let request = self
                .interceptors
                .request
                .run_chain(request_handlers, Ok(request), wait_lock)
                .await;
            let response = match request {
                Ok(request) => self.http.send(request).await,
                Err(err) => {
                    tracing::debug!("Request handler rejected: {}", err);
                    Err(err)
                }
            };
            self.interceptors
                .response
                .run_chain(response_handlers, response, wait_lock)
                .await
        }
    }
}
