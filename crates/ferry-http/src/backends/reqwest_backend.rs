//! reqwest-based connection adapter

use crate::backends::{outgoing_headers, response_body};
use crate::body::{FormData, FormPart, RenderedBody};
use crate::connection::{ConnectionAdapter, ReadyState, ReadyStateTracker, TransportResponse};
use crate::error::HttpError;
use crate::headers::Headers;
use crate::request::Request;

/// Adapter sending requests through a [`reqwest::Client`]
#[derive(Debug, Clone, Default)]
pub struct ReqwestAdapter {
    inner: reqwest::Client,
}

impl ReqwestAdapter {
    /// Create an adapter with a default client
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Create an adapter from a configured client
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

fn multipart_form(form: FormData) -> Result<reqwest::multipart::Form, HttpError> {
    let mut multipart = reqwest::multipart::Form::new();
    for (name, part) in form.iter() {
        multipart = match part {
            FormPart::Text(value) => multipart.text(name.to_string(), value.clone()),
            FormPart::File { blob, file_name } => {
                let mut file = reqwest::multipart::Part::bytes(blob.bytes().to_vec());
                if let Some(file_name) = file_name {
                    file = file.file_name(file_name.clone());
                }
                if let Some(mime_type) = blob.mime_type() {
                    file = file.mime_str(mime_type)?;
                }
                multipart.part(name.to_string(), file)
            }
        };
    }
    Ok(multipart)
}

#[async_trait::async_trait]
impl ConnectionAdapter for ReqwestAdapter {
    async fn exchange(
        &self,
        request: &Request,
        body: RenderedBody,
        ready_state: &ReadyStateTracker,
    ) -> Result<TransportResponse, HttpError> {
        let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
            .map_err(|e| HttpError::Build(e.to_string()))?;

        let mut builder = self.inner.request(method, request.url());
        for (name, value) in outgoing_headers(request, &body).to_flat_map() {
            builder = builder.header(name, value);
        }
        builder = match body {
            RenderedBody::Empty => builder,
            RenderedBody::Text(text) => builder.body(text),
            RenderedBody::Bytes(bytes) => builder.body(bytes),
            RenderedBody::Blob(blob) => builder.body(blob.into_bytes()),
            RenderedBody::FormData(form) => builder.multipart(multipart_form(form)?),
        };

        let response = builder.send().await?;
        ready_state.set(ReadyState::HeadersReceived);

        let status = response.status();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value)))
            .collect::<Headers>();

        ready_state.set(ReadyState::Loading);
        let bytes = response.bytes().await?;
        tracing::trace!("Received {} bytes from {}", bytes.len(), url);

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().map(str::to_string),
            body: response_body(
                status.as_u16(),
                bytes.to_vec(),
                &headers,
                request.response_type(),
            ),
            headers,
            url: Some(url),
        })
    }
}
