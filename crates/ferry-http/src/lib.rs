//! Platform agnostic HTTP client facade
//!
//! Requests are described once as canonical [`Request`] values and sent
//! through an interchangeable [`ConnectionAdapter`]. Every call settles the
//! same way whatever the transport: `Ok` with a 2xx [`Response`], or
//! [`Error::Response`] carrying the non-2xx, timed out or failed exchange.
//!
//! [`InterceptorHttp`] adds ordered request and response handlers with a
//! shared lock gate, so a client can for example pause every outgoing call
//! while a token is refreshed.
//!
//! # Example
//!
//! ```no_run
//! use ferry_http::{Error, HttpExt, InterceptorHttp, ReqwestAdapter};
//!
//! async fn example() -> Result<(), Error> {
//!     let client = InterceptorHttp::new(ReqwestAdapter::new());
//!     client.interceptors.request.use_fulfilled(|request| async move {
//!         Ok(request.with_header("Authorization", "Bearer token"))
//!     });
//!
//!     let response = client.get("https://api.example.com/data", None).await?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```

pub mod backends;
mod body;
mod client;
mod connection;
mod error;
mod headers;
mod interceptor;
mod interceptor_http;
mod method;
mod options;
mod request;
mod response;
mod search_params;
mod settings;

#[cfg(all(feature = "bitreq", not(target_arch = "wasm32")))]
pub use backends::BitreqAdapter;
#[cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]
pub use backends::ReqwestAdapter;
pub use body::{
    decode_bytes, encode_text, Blob, Body, BodyReader, ContentType, EncodingHint, FormData,
    FormPart, RenderedBody,
};
pub use client::{merge_call_options, prepare_verb, Http, HttpExt, RequestTarget};
pub use connection::{
    http_request, Connection, ConnectionAdapter, ReadyState, ReadyStateTracker,
    TransportResponse,
};
pub use error::{Error, HttpError};
pub use headers::Headers;
pub use interceptor::{HandlerId, Interceptor, DEFAULT_CLEAR_REASON};
pub use interceptor_http::{InterceptorHttp, Interceptors};
pub use method::RequestMethod;
pub use options::{InterceptorOptions, RequestOptions};
pub use request::{build_url, detect_content_type, Request, ResponseContentType};
pub use response::{is_success, Response, ResponseOptions, ResponseType};
pub use search_params::{encode_component, SearchParams};
pub use settings::{ClientSettings, InterceptorSettings, Settings};
