//! Native transport adapters
//!
//! Both adapters share the header defaults and the response body shaping
//! defined here so that swapping one for the other is unobservable to callers.

#[cfg(all(feature = "bitreq", not(target_arch = "wasm32")))]
pub mod bitreq_backend;
#[cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]
pub mod reqwest_backend;

#[cfg(all(feature = "bitreq", not(target_arch = "wasm32")))]
pub use bitreq_backend::BitreqAdapter;
#[cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]
pub use reqwest_backend::ReqwestAdapter;

use crate::body::{Blob, Body, ContentType, RenderedBody};
use crate::headers::Headers;
use crate::request::{Request, ResponseContentType};

/// `Accept` header sent when the request does not carry one
pub const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";

/// Headers to put on the wire for `request`.
///
/// Adds `Accept` when absent and a `Content-Type` derived from the content
/// type tag when absent. Multipart and raw byte bodies get no default, the
/// former because the transport owns the boundary.
pub fn outgoing_headers(request: &Request, body: &RenderedBody) -> Headers {
    let mut headers = request.headers().clone();
    if !headers.has("accept") {
        headers.set("Accept", DEFAULT_ACCEPT);
    }
    if !headers.has("content-type") {
        let content_type = match (request.content_type(), body) {
            (ContentType::Blob, RenderedBody::Blob(blob)) => blob.mime_type(),
            (ContentType::Blob, _) => None,
            (other, _) => other.default_header(),
        };
        if let Some(content_type) = content_type {
            headers.set("Content-Type", content_type);
        }
    }
    headers
}

/// Remove a leading `)]}'` XSSI guard line
pub fn strip_xssi_prefix(text: &str) -> &str {
    let Some(rest) = text.strip_prefix(")]}'") else {
        return text;
    };
    let rest = rest.strip_prefix(',').unwrap_or(rest);
    rest.strip_prefix('\n').unwrap_or(text)
}

/// Shape a received payload according to the request's response type hint.
///
/// A 204 or an empty payload yields no body. Text is read as UTF-8 with the
/// XSSI guard stripped; a JSON hint falls back to text when parsing fails.
pub fn response_body(
    status: u16,
    bytes: Vec<u8>,
    headers: &Headers,
    response_type: Option<ResponseContentType>,
) -> Option<Body> {
    if status == 204 || bytes.is_empty() {
        return None;
    }

    match response_type {
        Some(ResponseContentType::ArrayBuffer) => Some(Body::Bytes(bytes)),
        Some(ResponseContentType::Blob) => Some(Body::Blob(match headers.get("content-type") {
            Some(mime_type) => Blob::with_type(bytes, mime_type),
            None => Blob::new(bytes),
        })),
        Some(ResponseContentType::Json) => {
            let text = String::from_utf8_lossy(&bytes);
            let text = strip_xssi_prefix(&text);
            match serde_json::from_str(text) {
                Ok(value) => Some(Body::Json(value)),
                Err(err) => {
                    tracing::debug!("Response is not valid JSON, keeping text: {}", err);
                    Some(Body::Text(text.to_string()))
                }
            }
        }
        Some(ResponseContentType::Text) | None => {
            let text = String::from_utf8_lossy(&bytes);
            Some(Body::Text(strip_xssi_prefix(&text).to_string()))
        }
    }
}
