use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use rabbitmon_api::{describe, Api, Method, Requester};
use rabbitmon_core::prelude::*;

use super::snapshot::{decode_object, Metrics, MetricsDisplay};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelData {
    #[serde(default)]
    pub node: String,
    pub vhost: String,
    pub name: String,
    #[serde(default)]
    pub number: u64,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// A channel multiplexed over a connection
pub struct Channel<R> {
    api: Arc<Api<R>>,
    data: ChannelData,
}

impl<R: Requester> Channel<R> {
    pub fn new(api: Arc<Api<R>>, data: ChannelData) -> Self {
        Self { api, data }
    }

    pub(crate) fn from_object(api: Arc<Api<R>>, name: &str, object: Map<String, Value>) -> Result<Self> {
        let data = decode_object(&describe(Method::Get, &["channels", name]), object)?;
        Ok(Self::new(api, data))
    }

    pub fn node(&self) -> &str {
        &self.data.node
    }

    pub fn vhost(&self) -> &str {
        &self.data.vhost
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn number(&self) -> u64 {
        self.data.number
    }

    pub fn metrics(&self) -> &Metrics {
        &self.data.metrics
    }

    pub fn data(&self) -> &ChannelData {
        &self.data
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let object = self.api.channel(self.name()).await?;
        let operation = describe(Method::Get, &["channels", self.name()]);
        self.data = decode_object(&operation, object)?;
        Ok(())
    }
}

impl<R> Clone for Channel<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            data: self.data.clone(),
        }
    }
}

impl<R> fmt::Debug for Channel<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel").field("data", &self.data).finish()
    }
}

impl<R> fmt::Display for Channel<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Channel {}:{}({}) - {}>",
            self.data.vhost,
            self.data.name,
            self.data.number,
            MetricsDisplay(&self.data.metrics)
        )
    }
}
