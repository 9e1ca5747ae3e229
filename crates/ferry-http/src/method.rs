//! HTTP request methods

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// HTTP method of a canonical request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
    /// HEAD
    Head,
    /// PATCH
    Patch,
}

impl RequestMethod {
    /// Upper-case wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Options => "OPTIONS",
            RequestMethod::Head => "HEAD",
            RequestMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(RequestMethod::Get),
            "POST" => Ok(RequestMethod::Post),
            "PUT" => Ok(RequestMethod::Put),
            "DELETE" => Ok(RequestMethod::Delete),
            "OPTIONS" => Ok(RequestMethod::Options),
            "HEAD" => Ok(RequestMethod::Head),
            "PATCH" => Ok(RequestMethod::Patch),
            _ => Err(Error::UnsupportedMethod(format!(
                "Invalid request method. The method \"{s}\" is not supported."
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case() {
        assert_eq!("get".parse::<RequestMethod>().ok(), Some(RequestMethod::Get));
        assert_eq!("Patch".parse::<RequestMethod>().ok(), Some(RequestMethod::Patch));
        assert_eq!("OPTIONS".parse::<RequestMethod>().ok(), Some(RequestMethod::Options));
    }

    #[test]
    fn test_rejects_unknown_method() {
        let err = "TRACE".parse::<RequestMethod>().expect_err("TRACE is not supported");
        assert!(matches!(err, Error::UnsupportedMethod(msg) if msg.contains("TRACE")));
    }

    #[test]
    fn test_display_is_wire_name() {
        assert_eq!(RequestMethod::Delete.to_string(), "DELETE");
        assert_eq!(RequestMethod::default(), RequestMethod::Get);
    }
}
