//! # rabbitmon-http - HTTP Transport
//!
//! A [`rabbitmon_api::Requester`] that talks to the management plugin over
//! HTTP(S) using reqwest, plus the TOML settings it is built from.
//!
//! ```no_run
//! # async fn run() -> rabbitmon_core::Result<()> {
//! use rabbitmon_api::Api;
//! use rabbitmon_http::{HttpConfig, HttpRequester};
//!
//! let config = HttpConfig::new("http://localhost:15672", "guest", "guest");
//! let api = Api::new(HttpRequester::from_config(&config)?);
//! let overview = api.overview().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;

pub use client::HttpRequester;
pub use config::{load_config, parse_config, HttpConfig, TlsMode};
