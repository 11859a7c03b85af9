//! Transport contract for the management API
//!
//! A [`Requester`] performs one HTTP round trip: method, path segments,
//! optional JSON body and optional query. It returns `Some(value)` when the
//! broker answered with a body and `None` when the body was empty. Any
//! non-success status is an error, and no JSON parse is attempted for it.
//!
//! Path segments are handed over unjoined; implementations encode each one
//! with [`encode_segment`] so that names containing `/` (the default vhost)
//! survive the round trip as `%2F`.

use std::fmt;
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use rabbitmon_core::prelude::*;

/// Characters left as-is in a path segment; everything else is escaped.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// HTTP methods used by the management API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered key/value query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Add a boolean parameter, serialized as `true` / `false`
    pub fn with_flag(self, key: impl Into<String>, value: bool) -> Self {
        self.with(key, if value { "true" } else { "false" })
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// One HTTP round trip against the management API
#[trait_variant::make(Requester: Send)]
pub trait LocalRequester {
    /// Perform the request.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] for a 404 response.
    /// - [`Error::Transport`] for any other non-success status or a
    ///   connection failure.
    async fn request(
        &self,
        method: Method,
        path: &[&str],
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> Result<Option<Value>>;
}

/// A transport shared between several adapters
impl<T> Requester for Arc<T>
where
    T: Requester + Send + Sync,
{
    async fn request(
        &self,
        method: Method,
        path: &[&str],
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> Result<Option<Value>> {
        <T as Requester>::request(self, method, path, body, query).await
    }
}

/// Percent-encode a single path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Encode each segment independently and join them with `/`
pub fn encode_path(path: &[&str]) -> String {
    path.iter()
        .map(|segment| encode_segment(segment))
        .collect::<Vec<_>>()
        .join("/")
}

/// Operation identity used in errors and logs, e.g. `GET queues/%2F/jobs`
pub fn describe(method: Method, path: &[&str]) -> String {
    format!("{} {}", method, encode_path(path))
}
