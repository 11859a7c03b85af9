use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use rabbitmon_core::prelude::*;

use super::snapshot::{decode, object_or_empty, Metrics};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageData {
    #[serde(default)]
    pub exchange: String,
    #[serde(default)]
    pub routing_key: String,
    #[serde(default)]
    pub redelivered: bool,
    /// Messages left in the queue after this one was fetched
    #[serde(default)]
    pub message_count: u64,
    pub payload_encoding: String,
    #[serde(default)]
    pub payload_bytes: u64,
    pub payload: String,
    #[serde(default, deserialize_with = "object_or_empty")]
    pub properties: Map<String, Value>,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// A message fetched from a queue
///
/// Immutable; holds no reference to the adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    data: MessageData,
}

impl Message {
    pub fn new(data: MessageData) -> Self {
        Self { data }
    }

    pub(crate) fn from_value(operation: &str, value: Value) -> Result<Self> {
        Ok(Self::new(decode(operation, value)?))
    }

    pub fn exchange(&self) -> &str {
        &self.data.exchange
    }

    pub fn routing_key(&self) -> &str {
        &self.data.routing_key
    }

    pub fn redelivered(&self) -> bool {
        self.data.redelivered
    }

    pub fn message_count(&self) -> u64 {
        self.data.message_count
    }

    /// `"string"` or `"base64"`
    pub fn payload_encoding(&self) -> &str {
        &self.data.payload_encoding
    }

    pub fn payload_bytes(&self) -> u64 {
        self.data.payload_bytes
    }

    pub fn payload(&self) -> &str {
        &self.data.payload
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.data.properties
    }

    pub fn metrics(&self) -> &Metrics {
        &self.data.metrics
    }

    pub fn data(&self) -> &MessageData {
        &self.data
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Message {}:{} - {}>",
            self.data.exchange, self.data.routing_key, self.data.payload
        )
    }
}
