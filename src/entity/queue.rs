use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use rabbitmon_api::{describe, Api, GetMessages, Method, QueueAction, Requester};
use rabbitmon_core::prelude::*;

use super::binding::{Binding, BindingData};
use super::message::Message;
use super::snapshot::{decode_listing, decode_object, Metrics, MetricsDisplay};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueData {
    pub vhost: String,
    pub name: String,
    #[serde(default)]
    pub durable: bool,
    #[serde(default)]
    pub auto_delete: bool,
    #[serde(default)]
    pub arguments: Map<String, Value>,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// A queue within a vhost
pub struct Queue<R> {
    api: Arc<Api<R>>,
    data: QueueData,
}

impl<R: Requester> Queue<R> {
    pub fn new(api: Arc<Api<R>>, data: QueueData) -> Self {
        Self { api, data }
    }

    pub(crate) fn from_object(
        api: Arc<Api<R>>,
        vhost: &str,
        name: &str,
        object: Map<String, Value>,
    ) -> Result<Self> {
        let data = decode_object(&describe(Method::Get, &["queues", vhost, name]), object)?;
        Ok(Self::new(api, data))
    }

    pub fn vhost(&self) -> &str {
        &self.data.vhost
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn durable(&self) -> bool {
        self.data.durable
    }

    pub fn auto_delete(&self) -> bool {
        self.data.auto_delete
    }

    pub fn arguments(&self) -> &Map<String, Value> {
        &self.data.arguments
    }

    pub fn node(&self) -> Option<&str> {
        self.data.node.as_deref()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.data.metrics
    }

    pub fn data(&self) -> &QueueData {
        &self.data
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let object = self.api.queue(self.vhost(), self.name()).await?;
        let operation = describe(Method::Get, &["queues", self.vhost(), self.name()]);
        self.data = decode_object(&operation, object)?;
        Ok(())
    }

    /// Bindings with this queue as the destination, without the implicit
    /// default-exchange binding
    pub async fn bindings(&self) -> Result<Vec<Binding<R>>> {
        let items = self.api.queue_bindings(self.vhost(), self.name()).await?;
        let operation = describe(
            Method::Get,
            &["queues", self.vhost(), self.name(), "bindings"],
        );
        Ok(decode_listing::<BindingData>(&operation, "source", items)?
            .into_iter()
            .map(|data| Binding::new(Arc::clone(&self.api), data))
            .collect())
    }

    /// Fetch messages. See [`GetMessages`] for the options and
    /// [`rabbitmon_api::MessageDialect`] for which combinations each
    /// management version accepts.
    pub async fn get_messages(&self, request: &GetMessages) -> Result<Vec<Message>> {
        let items = self
            .api
            .queue_messages(self.vhost(), self.name(), request)
            .await?;
        let operation = describe(Method::Post, &["queues", self.vhost(), self.name(), "get"]);
        items
            .into_iter()
            .map(|item| Message::from_value(&operation, item))
            .collect()
    }

    /// Drop every ready message
    pub async fn purge(&self) -> Result<()> {
        self.api.purge_queue(self.vhost(), self.name()).await?;
        info!("Purged queue {}:{}", self.vhost(), self.name());
        Ok(())
    }

    pub async fn delete(&self, if_empty: bool, if_unused: bool) -> Result<()> {
        self.api
            .delete_queue(self.vhost(), self.name(), if_empty, if_unused)
            .await?;
        info!("Deleted queue {}:{}", self.vhost(), self.name());
        Ok(())
    }

    /// Start synchronising a mirrored queue
    pub async fn sync(&self) -> Result<()> {
        self.api
            .queue_action(self.vhost(), self.name(), QueueAction::Sync)
            .await
    }

    pub async fn cancel_sync(&self) -> Result<()> {
        self.api
            .queue_action(self.vhost(), self.name(), QueueAction::CancelSync)
            .await
    }
}

impl<R> Clone for Queue<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            data: self.data.clone(),
        }
    }
}

impl<R> fmt::Debug for Queue<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue").field("data", &self.data).finish()
    }
}

impl<R> fmt::Display for Queue<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Queue {}:{} - {}>",
            self.data.vhost,
            self.data.name,
            MetricsDisplay(&self.data.metrics)
        )
    }
}
