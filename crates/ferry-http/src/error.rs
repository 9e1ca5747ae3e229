//! Error types

use thiserror::Error;

use crate::response::Response;

/// Errors surfaced to callers of the client facades and interceptor handlers
#[derive(Debug, Error)]
pub enum Error {
    /// Bad call-site usage, reported before any network or interceptor activity
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The HTTP method is unknown or not supported by the bound transport
    #[error("Unsupported request method: {0}")]
    UnsupportedMethod(String),
    /// Requested body encoding is not in the supported set
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
    /// Requested response type is not supported by the bound transport
    #[error("Unsupported response type: {0}")]
    UnsupportedResponseType(String),
    /// The body cannot be rendered as requested
    #[error("Invalid body: {0}")]
    InvalidBody(String),
    /// The interceptor lock was cleared while a handler waited on it
    #[error("{0}")]
    LockCleared(String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Failure raised by a user supplied interceptor handler
    #[error("{0}")]
    Handler(String),
    /// A settled exchange that did not succeed: non-2xx status, timeout or
    /// transport failure (the latter two carry a synthesized error response)
    #[error("{0}")]
    Response(Box<Response>),
}

impl Error {
    /// The response carried by this rejection, if any
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::Response(response) => Some(response),
            _ => None,
        }
    }

    /// Consume the rejection and return the carried response, if any
    pub fn into_response(self) -> Option<Response> {
        match self {
            Error::Response(response) => Some(*response),
            _ => None,
        }
    }
}

impl From<Response> for Error {
    fn from(response: Response) -> Self {
        Error::Response(Box::new(response))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Transport level failures reported by connection adapters
///
/// These never reach callers directly: the connection driver turns them into
/// synthesized error responses.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),
    /// Timeout raised by the transport itself
    ///
    /// Only a caller-configured client (see `ReqwestAdapter::from_reqwest`) or
    /// an OS level socket timeout produces this. Request timeouts are enforced
    /// by the connection driver and never surface here.
    #[error("Request timeout")]
    Timeout,
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Client build error
    #[error("Client build error: {0}")]
    Build(String),
    /// Other error
    #[error("{0}")]
    Other(String),
}

#[cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]
impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout
        } else if err.is_builder() {
            HttpError::Build(err.to_string())
        } else if err.is_connect() {
            HttpError::Connection(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }
}

#[cfg(all(feature = "bitreq", not(target_arch = "wasm32")))]
impl From<bitreq::Error> for HttpError {
    fn from(err: bitreq::Error) -> Self {
        use std::io;

        use bitreq::Error;

        match err {
            Error::InvalidUtf8InBody(_) => HttpError::Serialization(err.to_string()),
            Error::InvalidUtf8InResponse => HttpError::Serialization(err.to_string()),
            Error::IoError(io_err) => {
                if io_err.kind() == io::ErrorKind::TimedOut {
                    HttpError::Timeout
                } else if io_err.kind() == io::ErrorKind::ConnectionRefused
                    || io_err.kind() == io::ErrorKind::ConnectionReset
                    || io_err.kind() == io::ErrorKind::ConnectionAborted
                    || io_err.kind() == io::ErrorKind::NotConnected
                {
                    HttpError::Connection(io_err.to_string())
                } else {
                    HttpError::Other(io_err.to_string())
                }
            }
            Error::AddressNotFound => HttpError::Connection(err.to_string()),
            _ => HttpError::Other(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::Serialization(err.to_string())
    }
}
