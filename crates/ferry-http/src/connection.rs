//! Transport contract and the connection driver shared by every adapter
//!
//! An adapter only performs the exchange. [`Connection`] wraps it with the
//! behavior every transport must share: ready-state tracking, duration
//! measurement, timeouts, and mapping of the outcome onto a canonical
//! [`Response`] that resolves on 2xx and rejects otherwise.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::Instrument;

use crate::body::{Body, RenderedBody};
use crate::error::{Error, HttpError};
use crate::headers::Headers;
use crate::method::RequestMethod;
use crate::request::{Request, ResponseContentType};
use crate::response::{Response, ResponseOptions, ResponseType};

/// Progress of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReadyState {
    /// Not dispatched yet
    #[default]
    Unsent,
    /// Handed to the transport
    Open,
    /// Status line and headers received
    HeadersReceived,
    /// Body being received
    Loading,
    /// Settled
    Done,
    /// Aborted after a timeout
    Cancelled,
}

/// Handle an adapter uses to report progress
#[derive(Debug, Clone)]
pub struct ReadyStateTracker {
    tx: Arc<watch::Sender<ReadyState>>,
}

impl ReadyStateTracker {
    fn new() -> (Self, watch::Receiver<ReadyState>) {
        let (tx, rx) = watch::channel(ReadyState::Unsent);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Report a new state
    pub fn set(&self, state: ReadyState) {
        self.tx.send_replace(state);
    }

    /// Last reported state
    pub fn get(&self) -> ReadyState {
        *self.tx.borrow()
    }
}

/// What an adapter hands back after a completed HTTP exchange, whatever the status
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    /// HTTP status
    pub status: u16,
    /// Reason phrase, "OK" when absent
    pub status_text: Option<String>,
    /// Response headers
    pub headers: Headers,
    /// Decoded body
    pub body: Option<Body>,
    /// Final URL, the request URL when absent
    pub url: Option<String>,
}

/// A host specific transport
///
/// Implementations translate a canonical request into a host call and report
/// the outcome. Any completed exchange is `Ok`, whatever its status; only
/// failures to complete one are `Err`. Timeouts are enforced by the caller by
/// dropping the returned future.
#[async_trait::async_trait]
pub trait ConnectionAdapter: Send + Sync + fmt::Debug {
    /// Perform the exchange for `request` with its already rendered `body`
    async fn exchange(
        &self,
        request: &Request,
        body: RenderedBody,
        ready_state: &ReadyStateTracker,
    ) -> Result<TransportResponse, HttpError>;

    /// Whether the host can issue `method`
    fn supports_method(&self, _method: RequestMethod) -> bool {
        true
    }

    /// Whether the host can produce `response_type`
    fn supports_response_type(&self, _response_type: ResponseContentType) -> bool {
        true
    }
}

/// One in-flight exchange
pub struct Connection {
    request: Arc<Request>,
    ready_state: watch::Receiver<ReadyState>,
    response: BoxFuture<'static, Result<Response, Error>>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("request", &self.request)
            .field("ready_state", &*self.ready_state.borrow())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Open a connection for `request` through `adapter`.
    ///
    /// Nothing is sent until [`Connection::response`] is awaited.
    pub fn open(adapter: Arc<dyn ConnectionAdapter>, request: Request) -> Self {
        let request = Arc::new(request);
        let (tracker, ready_state) = ReadyStateTracker::new();
        let span = tracing::debug_span!(
            "connection",
            method = %request.method(),
            url = %request.url()
        );
        let response = drive(adapter, request.clone(), tracker)
            .instrument(span)
            .boxed();

        Self {
            request,
            ready_state,
            response,
        }
    }

    /// The request being sent
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Current progress
    pub fn ready_state(&self) -> ReadyState {
        *self.ready_state.borrow()
    }

    /// Watch progress changes
    pub fn watch_ready_state(&self) -> watch::Receiver<ReadyState> {
        self.ready_state.clone()
    }

    /// Settle the exchange: `Ok` for 2xx, `Err(Error::Response)` for any other
    /// status, a timeout or a transport failure
    pub async fn response(self) -> Result<Response, Error> {
        self.response.await
    }
}

fn error_response(
    request: &Arc<Request>,
    status_text: String,
    body: Option<Body>,
    duration: std::time::Duration,
) -> Response {
    ResponseOptions::new()
        .response_type(ResponseType::Error)
        .status(0)
        .status_text(status_text)
        .url(request.url())
        .maybe_body(body)
        .duration(duration)
        .request(request.clone())
        .build()
}

async fn drive(
    adapter: Arc<dyn ConnectionAdapter>,
    request: Arc<Request>,
    ready_state: ReadyStateTracker,
) -> Result<Response, Error> {
    if !adapter.supports_method(request.method()) {
        return Err(Error::UnsupportedMethod(format!(
            "{} is not supported by this transport",
            request.method()
        )));
    }
    if let Some(response_type) = request.response_type() {
        if !adapter.supports_response_type(response_type) {
            return Err(Error::UnsupportedResponseType(
                "requested response type is not supported by this transport".to_string(),
            ));
        }
    }
    let body = request.get_body()?;

    ready_state.set(ReadyState::Open);
    tracing::debug!("Dispatching request");
    let started = Instant::now();
    let exchange = adapter.exchange(&request, body, &ready_state);

    let outcome = match request.timeout() {
        Some(timeout) => match tokio::time::timeout(timeout, exchange).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let elapsed = started.elapsed();
                ready_state.set(ReadyState::Cancelled);
                tracing::warn!(
                    "Request timed out after {}ms (configured {}ms)",
                    elapsed.as_millis(),
                    timeout.as_millis()
                );
                let status_text = format!(
                    "Request timed out {}/{}",
                    timeout.as_millis(),
                    elapsed.as_millis()
                );
                return Err(error_response(&request, status_text, None, elapsed).into());
            }
        },
        None => exchange.await,
    };

    let duration = started.elapsed();
    ready_state.set(ReadyState::Done);

    match outcome {
        Ok(raw) => {
            let response = ResponseOptions::new()
                .status(raw.status)
                .status_text(raw.status_text.unwrap_or_else(|| "OK".to_string()))
                .headers(raw.headers)
                .url(raw.url.unwrap_or_else(|| request.url().to_string()))
                .maybe_body(raw.body)
                .duration(duration)
                .request(request.clone())
                .build();
            tracing::debug!(
                "Request settled with status {} in {}ms",
                response.status(),
                duration.as_millis()
            );
            if response.ok() {
                Ok(response)
            } else {
                Err(response.into())
            }
        }
        Err(err) => {
            tracing::warn!("Transport failure: {}", err);
            let message = err.to_string();
            let body = Some(Body::Text(message.clone()));
            Err(error_response(&request, message, body, duration).into())
        }
    }
}

/// Send `request` through `adapter` and wait for it to settle
pub async fn http_request(
    adapter: &Arc<dyn ConnectionAdapter>,
    request: Request,
) -> Result<Response, Error> {
    Connection::open(adapter.clone(), request).response().await
}
