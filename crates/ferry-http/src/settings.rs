//! Client settings loaded from a TOML file and the environment
//!
//! ```toml
//! [client]
//! method = "GET"
//! timeout_ms = 5000
//! response_type = "json"
//!
//! [client.headers]
//! X-Client = "ferry"
//!
//! [interceptor]
//! wait_lock = true
//! ```

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};

use crate::headers::Headers;
use crate::method::RequestMethod;
use crate::options::{InterceptorOptions, RequestOptions};
use crate::request::ResponseContentType;

/// Default method
pub const ENV_METHOD: &str = "FERRY_METHOD";
/// Timeout in milliseconds
pub const ENV_TIMEOUT_MS: &str = "FERRY_TIMEOUT_MS";
/// Credentials flag
pub const ENV_WITH_CREDENTIALS: &str = "FERRY_WITH_CREDENTIALS";
/// Response type hint
pub const ENV_RESPONSE_TYPE: &str = "FERRY_RESPONSE_TYPE";
/// Interceptor wait-lock flag
pub const ENV_WAIT_LOCK: &str = "FERRY_WAIT_LOCK";
/// Interceptor skip flag
pub const ENV_SKIP_INTERCEPTOR: &str = "FERRY_SKIP_INTERCEPTOR";

/// `[client]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Default method
    pub method: Option<RequestMethod>,
    /// Headers sent with every request
    pub headers: BTreeMap<String, String>,
    /// Transport timeout in milliseconds
    pub timeout_ms: Option<u64>,
    /// Send credentials on cross-site requests
    pub with_credentials: Option<bool>,
    /// Response type hint
    pub response_type: Option<ResponseContentType>,
}

/// `[interceptor]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptorSettings {
    /// `false` lets handlers run while a lock is held
    pub wait_lock: Option<bool>,
    /// `true` bypasses every handler
    pub skip_interceptor: Option<bool>,
}

/// Client-level defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Request defaults
    pub client: ClientSettings,
    /// Interceptor defaults
    pub interceptor: InterceptorSettings,
}

impl Settings {
    /// Load settings from `config_file_name` layered over the defaults.
    ///
    /// Without a file the defaults are returned. A file that cannot be read or
    /// parsed is logged and the defaults are used instead.
    #[must_use]
    pub fn new<P>(config_file_name: Option<P>) -> Self
    where
        P: Into<PathBuf>,
    {
        let default_settings = Self::default();
        let Some(config_file_name) = config_file_name else {
            return default_settings;
        };

        match Self::from_file(&default_settings, config_file_name) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!(
                    "Error reading config file, falling back to defaults. Error: {e:?}"
                );
                default_settings
            }
        }
    }

    /// Load `config_file_name` over `default`
    pub fn from_file<P>(default: &Settings, config_file_name: P) -> Result<Self, ConfigError>
    where
        P: Into<PathBuf>,
    {
        let path: PathBuf = config_file_name.into();
        let config = Config::builder()
            .add_source(Config::try_from(default)?)
            .add_source(File::from(path))
            .build()?;
        config.try_deserialize()
    }

    /// Override fields from `FERRY_*` environment variables. Unparsable values are ignored.
    pub fn from_env(mut self) -> Self {
        if let Ok(method) = env::var(ENV_METHOD) {
            match RequestMethod::from_str(&method) {
                Ok(method) => self.client.method = Some(method),
                Err(err) => tracing::warn!("Ignoring {}: {}", ENV_METHOD, err),
            }
        }

        if let Ok(timeout) = env::var(ENV_TIMEOUT_MS) {
            if let Ok(timeout) = timeout.parse() {
                self.client.timeout_ms = Some(timeout);
            }
        }

        if let Ok(with_credentials) = env::var(ENV_WITH_CREDENTIALS) {
            if let Ok(with_credentials) = with_credentials.parse() {
                self.client.with_credentials = Some(with_credentials);
            }
        }

        if let Ok(response_type) = env::var(ENV_RESPONSE_TYPE) {
            if let Ok(response_type) =
                serde_json::from_value(serde_json::Value::String(response_type.to_lowercase()))
            {
                self.client.response_type = Some(response_type);
            }
        }

        if let Ok(wait_lock) = env::var(ENV_WAIT_LOCK) {
            if let Ok(wait_lock) = wait_lock.parse() {
                self.interceptor.wait_lock = Some(wait_lock);
            }
        }

        if let Ok(skip) = env::var(ENV_SKIP_INTERCEPTOR) {
            if let Ok(skip) = skip.parse() {
                self.interceptor.skip_interceptor = Some(skip);
            }
        }

        self
    }

    /// Client defaults described by these settings
    pub fn request_options(&self) -> RequestOptions {
        let headers = (!self.client.headers.is_empty()).then(|| {
            self.client
                .headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
                .collect::<Headers>()
        });
        let interceptor = (self.interceptor != InterceptorSettings::default()).then(|| {
            InterceptorOptions {
                wait_lock: self.interceptor.wait_lock,
                skip_interceptor: self.interceptor.skip_interceptor,
                extra: None,
            }
        });

        RequestOptions {
            method: self.client.method,
            headers,
            timeout: self
                .client
                .timeout_ms
                .map(std::time::Duration::from_millis),
            with_credentials: self.client.with_credentials,
            response_type: self.client.response_type,
            interceptor,
            ..RequestOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = Settings::new(Some("/nonexistent/ferry/config.toml"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.request_options(), RequestOptions::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            r#"
[client]
method = "POST"
timeout_ms = 250
response_type = "arraybuffer"

[client.headers]
x-client = "ferry"

[interceptor]
wait_lock = false
"#
        )
        .expect("write");

        let settings = Settings::from_file(&Settings::default(), file.path()).expect("settings");
        assert_eq!(settings.client.method, Some(RequestMethod::Post));
        assert_eq!(settings.interceptor.wait_lock, Some(false));

        let options = settings.request_options();
        assert_eq!(options.method, Some(RequestMethod::Post));
        assert_eq!(options.timeout, Some(Duration::from_millis(250)));
        assert_eq!(options.response_type, Some(ResponseContentType::ArrayBuffer));
        assert_eq!(
            options.headers.as_ref().and_then(|h| h.get("X-Client")),
            Some("ferry")
        );
        assert_eq!(options.interceptor.and_then(|i| i.wait_lock), Some(false));
    }

    #[test]
    fn test_env_overrides() {
        env::set_var(ENV_TIMEOUT_MS, "1500");
        env::set_var(ENV_SKIP_INTERCEPTOR, "true");
        env::set_var(ENV_RESPONSE_TYPE, "TEXT");

        let settings = Settings::default().from_env();
        assert_eq!(settings.client.timeout_ms, Some(1500));
        assert_eq!(settings.interceptor.skip_interceptor, Some(true));
        assert_eq!(settings.client.response_type, Some(ResponseContentType::Text));

        env::remove_var(ENV_TIMEOUT_MS);
        env::remove_var(ENV_SKIP_INTERCEPTOR);
        env::remove_var(ENV_RESPONSE_TYPE);
    }
}
