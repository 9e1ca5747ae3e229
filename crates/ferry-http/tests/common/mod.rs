//! Stub transport shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use ferry_http::{
    Body, BodyReader, ConnectionAdapter, HttpError, ReadyState, ReadyStateTracker, RenderedBody,
    Request, TransportResponse,
};
use parking_lot::Mutex;

pub const URL: &str = "https://a.b/c";

#[derive(Debug, Clone)]
pub enum Reply {
    /// Settle with this status and body
    Status(u16, Option<Body>),
    /// Settle with 200 and the request body
    Echo,
    /// Fail to complete the exchange
    Fail(String),
    /// Never settle
    Hang,
}

#[derive(Debug, Clone)]
pub struct StubAdapter {
    reply: Reply,
    seen: Arc<Mutex<Vec<(Request, RenderedBody)>>>,
}

impl StubAdapter {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn ok() -> Self {
        Self::new(Reply::Status(200, None))
    }

    pub fn status(status: u16) -> Self {
        Self::new(Reply::Status(status, None))
    }

    /// Requests that reached the transport, in order
    pub fn requests(&self) -> Vec<Request> {
        self.seen.lock().iter().map(|(r, _)| r.clone()).collect()
    }

    /// Rendered bodies that reached the transport, in order
    pub fn bodies(&self) -> Vec<RenderedBody> {
        self.seen.lock().iter().map(|(_, b)| b.clone()).collect()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

#[async_trait::async_trait]
impl ConnectionAdapter for StubAdapter {
    async fn exchange(
        &self,
        request: &Request,
        body: RenderedBody,
        ready_state: &ReadyStateTracker,
    ) -> Result<TransportResponse, HttpError> {
        self.seen.lock().push((request.clone(), body));
        ready_state.set(ReadyState::HeadersReceived);

        match &self.reply {
            Reply::Status(status, body) => Ok(TransportResponse {
                status: *status,
                status_text: Some(reason(*status).to_string()),
                body: body.clone(),
                ..Default::default()
            }),
            Reply::Echo => Ok(TransportResponse {
                status: 200,
                body: request.raw_body().cloned(),
                ..Default::default()
            }),
            Reply::Fail(message) => Err(HttpError::Connection(message.clone())),
            Reply::Hang => futures::future::pending().await,
        }
    }
}
