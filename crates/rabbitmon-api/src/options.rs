//! Typed arguments for write operations

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use rabbitmon_core::prelude::*;

/// The kind of entity a binding routes to
///
/// Selects the `q` or `e` path segment of binding endpoints. Always supplied
/// by the caller, never inferred from a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationType {
    Queue,
    Exchange,
}

impl DestinationType {
    /// Value of the `destination_type` field in binding listings
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationType::Queue => "queue",
            DestinationType::Exchange => "exchange",
        }
    }

    /// Path segment used by the binding endpoints
    pub fn path_segment(&self) -> &'static str {
        match self {
            DestinationType::Queue => "q",
            DestinationType::Exchange => "e",
        }
    }
}

impl fmt::Display for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DestinationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "queue" => Ok(DestinationType::Queue),
            "exchange" => Ok(DestinationType::Exchange),
            other => Err(Error::invalid_state(format!(
                "unknown binding destination type {other:?}"
            ))),
        }
    }
}

/// Body of an exchange declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeOptions {
    #[serde(rename = "type")]
    pub exchange_type: String,
    pub auto_delete: bool,
    pub durable: bool,
    pub internal: bool,
    pub arguments: Map<String, Value>,
}

impl ExchangeOptions {
    /// A durable, non-auto-delete, non-internal exchange with no arguments
    pub fn new(exchange_type: impl Into<String>) -> Self {
        Self {
            exchange_type: exchange_type.into(),
            auto_delete: false,
            durable: true,
            internal: false,
            arguments: Map::new(),
        }
    }

    pub fn durable(mut self, durable: bool) -> Self {
        self.durable = durable;
        self
    }

    pub fn auto_delete(mut self, auto_delete: bool) -> Self {
        self.auto_delete = auto_delete;
        self
    }

    pub fn internal(mut self, internal: bool) -> Self {
        self.internal = internal;
        self
    }

    pub fn argument(mut self, key: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(key.into(), value);
        self
    }
}

/// Body of a queue declaration; unset fields are left to the broker
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueueOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub durable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
}

impl QueueOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn durable(mut self, durable: bool) -> Self {
        self.durable = Some(durable);
        self
    }

    pub fn auto_delete(mut self, auto_delete: bool) -> Self {
        self.auto_delete = Some(auto_delete);
        self
    }

    pub fn argument(mut self, key: impl Into<String>, value: Value) -> Self {
        self.arguments
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }
}

/// Queue actions accepted by `POST queues/{vhost}/{name}/actions`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueAction {
    Sync,
    CancelSync,
}

/// Payload encoding requested when fetching or publishing messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    /// A string when the payload is valid UTF-8, base64 otherwise
    #[default]
    Auto,
    Base64,
}

/// What to fetch from a queue and what to do with the fetched messages
#[derive(Debug, Clone, PartialEq)]
pub struct GetMessages {
    pub count: u32,
    pub requeue: bool,
    pub encoding: PayloadEncoding,
    /// Truncate payloads larger than this many bytes. `None` omits the field,
    /// which the broker treats differently from a limit of 0.
    pub truncate: Option<u64>,
    pub reject: bool,
}

impl Default for GetMessages {
    fn default() -> Self {
        Self {
            count: 1,
            requeue: true,
            encoding: PayloadEncoding::Auto,
            truncate: None,
            reject: false,
        }
    }
}

impl GetMessages {
    pub fn new(count: u32) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }

    pub fn requeue(mut self, requeue: bool) -> Self {
        self.requeue = requeue;
        self
    }

    pub fn reject(mut self, reject: bool) -> Self {
        self.reject = reject;
        self
    }

    pub fn encoding(mut self, encoding: PayloadEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn truncate(mut self, bytes: u64) -> Self {
        self.truncate = Some(bytes);
        self
    }
}

/// A message to publish through an exchange
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Publish {
    pub properties: Map<String, Value>,
    pub routing_key: String,
    pub payload: String,
    pub payload_encoding: String,
}

impl Publish {
    /// A UTF-8 string payload with no properties
    pub fn text(routing_key: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            properties: Map::new(),
            routing_key: routing_key.into(),
            payload: payload.into(),
            payload_encoding: "string".to_string(),
        }
    }

    /// A payload that is already base64 encoded
    pub fn base64(routing_key: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            payload_encoding: "base64".to_string(),
            ..Self::text(routing_key, payload)
        }
    }

    pub fn property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}
