//! bitreq-based connection adapter

use std::sync::Arc;

use bitreq::RequestExt;

use crate::backends::{outgoing_headers, response_body};
use crate::body::RenderedBody;
use crate::connection::{ConnectionAdapter, ReadyState, ReadyStateTracker, TransportResponse};
use crate::error::HttpError;
use crate::headers::Headers;
use crate::method::RequestMethod;
use crate::request::Request;

/// Pooled connections kept by the default client
const DEFAULT_POOL_CAPACITY: usize = 10;

/// Adapter sending requests through a pooled [`bitreq::Client`]
///
/// Multipart bodies are not supported.
#[derive(Clone)]
pub struct BitreqAdapter {
    client: Arc<bitreq::Client>,
}

impl std::fmt::Debug for BitreqAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitreqAdapter").finish_non_exhaustive()
    }
}

impl Default for BitreqAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitreqAdapter {
    /// Create an adapter with a default connection pool
    pub fn new() -> Self {
        Self {
            client: Arc::new(bitreq::Client::new(DEFAULT_POOL_CAPACITY)),
        }
    }
}

fn bitreq_method(method: RequestMethod) -> bitreq::Method {
    match method {
        RequestMethod::Get => bitreq::Method::Get,
        RequestMethod::Post => bitreq::Method::Post,
        RequestMethod::Put => bitreq::Method::Put,
        RequestMethod::Delete => bitreq::Method::Delete,
        RequestMethod::Options => bitreq::Method::Options,
        RequestMethod::Head => bitreq::Method::Head,
        RequestMethod::Patch => bitreq::Method::Patch,
    }
}

#[async_trait::async_trait]
impl ConnectionAdapter for BitreqAdapter {
    async fn exchange(
        &self,
        request: &Request,
        body: RenderedBody,
        ready_state: &ReadyStateTracker,
    ) -> Result<TransportResponse, HttpError> {
        let mut outgoing = bitreq::Request::new(bitreq_method(request.method()), request.url());
        for (name, value) in outgoing_headers(request, &body).to_flat_map() {
            outgoing = outgoing.with_header(name, value);
        }
        outgoing = match body {
            RenderedBody::Empty => outgoing,
            RenderedBody::Text(text) => outgoing.with_body(text.into_bytes()),
            RenderedBody::Bytes(bytes) => outgoing.with_body(bytes),
            RenderedBody::Blob(blob) => outgoing.with_body(blob.into_bytes()),
            RenderedBody::FormData(_) => {
                return Err(HttpError::Other(
                    "multipart bodies are not supported by the bitreq adapter".to_string(),
                ))
            }
        };

        let response = outgoing
            .send_async_with_client(&self.client)
            .await
            .map_err(HttpError::from)?;
        ready_state.set(ReadyState::Loading);

        let status = response.status_code as u16;
        let headers = response
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect::<Headers>();
        let status_text = (!response.reason_phrase.is_empty()).then(|| response.reason_phrase.clone());
        let url = response.url.clone();

        Ok(TransportResponse {
            status,
            status_text,
            body: response_body(
                status,
                response.into_bytes(),
                &headers,
                request.response_type(),
            ),
            headers,
            url: Some(url),
        })
    }
}
