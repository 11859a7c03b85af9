//! reqwest-backed [`Requester`]

use std::time::Duration;

use reqwest::{Certificate, Client, StatusCode};
use serde_json::Value;

use rabbitmon_api::transport::{describe, encode_path, Method, Query, Requester};
use rabbitmon_core::prelude::*;

use crate::config::{HttpConfig, TlsMode};

/// Sends management requests over HTTP(S) with Basic authentication.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpRequester {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpRequester {
    /// Build a requester from validated settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the settings are invalid, the CA file
    /// cannot be read, or the client cannot be constructed.
    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));

        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        match config.tls {
            TlsMode::System => {}
            TlsMode::CaFile => {
                let path = config
                    .ca_file
                    .as_ref()
                    .ok_or_else(|| Error::config("tls = \"ca_file\" requires ca_file"))?;
                let pem = std::fs::read(path).map_err(|e| {
                    Error::config(format!("Failed to read CA file {}: {e}", path.display()))
                })?;
                let cert = Certificate::from_pem(&pem)
                    .map_err(|e| Error::config(format!("Invalid CA file {}: {e}", path.display())))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::AcceptInvalid => {
                warn!("TLS certificate verification disabled for {}", config.url);
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Full URL for a path below `/api`
    pub fn endpoint_url(&self, path: &[&str]) -> String {
        format!("{}/api/{}", self.base_url, encode_path(path))
    }
}

impl Requester for HttpRequester {
    async fn request(
        &self,
        method: Method,
        path: &[&str],
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> Result<Option<Value>> {
        let operation = describe(method, path);
        let url = self.endpoint_url(path);

        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Put => self.client.put(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        }
        .basic_auth(&self.username, Some(&self.password));

        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(query) = query {
            request = request.query(query.pairs());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(&operation, e.to_string()))?;

        let status = response.status();
        trace!("{} -> {}", operation, status);
        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found(operation));
        }
        if !status.is_success() {
            return Err(Error::transport(operation, format!("HTTP status {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::transport(&operation, e.to_string()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| Error::decode(operation, e))
    }
}
