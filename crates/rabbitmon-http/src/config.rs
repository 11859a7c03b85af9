//! Connection settings for the HTTP transport
//!
//! Loaded from a TOML file such as:
//!
//! ```toml
//! url = "https://rabbit.example.com:15671"
//! username = "monitor"
//! password = "secret"
//! tls = "ca_file"
//! ca_file = "/etc/rabbitmq/ca.pem"
//! timeout_secs = 10
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use rabbitmon_core::prelude::*;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How server certificates are verified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    /// Trust the platform's root store
    #[default]
    System,
    /// Trust the PEM certificate at `ca_file` in addition to the root store
    CaFile,
    /// Accept any certificate. Only for test brokers with self-signed certs.
    AcceptInvalid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Base URL of the management plugin, without the `/api` suffix
    pub url: String,

    pub username: String,

    pub password: String,

    #[serde(default)]
    pub tls: TlsMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<PathBuf>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl HttpConfig {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            tls: TlsMode::System,
            ca_file: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }

    /// Check that the settings can produce a working client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL does not parse or is not
    /// http/https, or if `tls = "ca_file"` has no `ca_file`.
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url()?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::config(format!(
                    "unsupported URL scheme {other:?} in {}",
                    self.url
                )))
            }
        }

        if self.tls == TlsMode::CaFile && self.ca_file.is_none() {
            return Err(Error::config("tls = \"ca_file\" requires ca_file"));
        }

        if self.timeout_secs == 0 {
            return Err(Error::config("timeout_secs must be greater than 0"));
        }

        Ok(())
    }

    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.url).map_err(|e| Error::config(format!("invalid url {:?}: {e}", self.url)))
    }
}

/// Parse settings from TOML text and validate them
pub fn parse_config(content: &str) -> Result<HttpConfig> {
    let config: HttpConfig = toml::from_str(content)
        .map_err(|e| Error::config(format!("Failed to parse config: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Load settings from a TOML file
///
/// # Errors
///
/// - [`Error::ConfigNotFound`] if the file does not exist.
/// - [`Error::Config`] if it cannot be read, parsed or validated.
pub fn load_config(path: &Path) -> Result<HttpConfig> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read {}: {e}", path.display())))?;
    let config = parse_config(&content)?;
    debug!("Loaded HTTP settings from {:?}", path);
    Ok(config)
}
