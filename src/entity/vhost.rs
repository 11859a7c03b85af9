use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use rabbitmon_api::{describe, Api, ExchangeOptions, Method, QueueOptions, Requester};
use rabbitmon_core::prelude::*;

use super::binding::Binding;
use super::exchange::Exchange;
use super::queue::Queue;
use super::snapshot::{decode_listing, decode_object, Metrics, MetricsDisplay};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VHostData {
    pub name: String,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// A virtual host
pub struct VHost<R> {
    api: Arc<Api<R>>,
    data: VHostData,
}

impl<R: Requester> VHost<R> {
    pub fn new(api: Arc<Api<R>>, data: VHostData) -> Self {
        Self { api, data }
    }

    pub(crate) fn from_object(api: Arc<Api<R>>, object: Map<String, Value>) -> Result<Self> {
        let operation = object_operation(&object);
        let data = decode_object(&operation, object)?;
        Ok(Self::new(api, data))
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn metrics(&self) -> &Metrics {
        &self.data.metrics
    }

    pub fn data(&self) -> &VHostData {
        &self.data
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let object = self.api.vhost(&self.data.name).await?;
        let operation = describe(Method::Get, &["vhosts", self.name()]);
        self.data = decode_object(&operation, object)?;
        Ok(())
    }

    /// Exchanges of this vhost by name, without the default exchange
    pub async fn exchanges(&self) -> Result<BTreeMap<String, Exchange<R>>> {
        let items = self.api.vhost_exchanges(&self.data.name).await?;
        let operation = describe(Method::Get, &["exchanges", self.name()]);
        Ok(decode_listing(&operation, "name", items)?
            .into_iter()
            .map(|data| {
                let exchange = Exchange::new(Arc::clone(&self.api), data);
                (exchange.name().to_string(), exchange)
            })
            .collect())
    }

    /// Look up one exchange by name. The default exchange is reachable here
    /// as `""`.
    pub async fn exchange(&self, name: &str) -> Result<Exchange<R>> {
        let object = self.api.exchange(&self.data.name, name).await?;
        Exchange::from_object(Arc::clone(&self.api), &self.data.name, name, object)
    }

    pub async fn queues(&self) -> Result<BTreeMap<String, Queue<R>>> {
        let items = self.api.vhost_queues(&self.data.name).await?;
        let operation = describe(Method::Get, &["queues", self.name()]);
        Ok(decode_listing(&operation, "name", items)?
            .into_iter()
            .map(|data| {
                let queue = Queue::new(Arc::clone(&self.api), data);
                (queue.name().to_string(), queue)
            })
            .collect())
    }

    pub async fn queue(&self, name: &str) -> Result<Queue<R>> {
        let object = self.api.queue(&self.data.name, name).await?;
        Queue::from_object(Arc::clone(&self.api), &self.data.name, name, object)
    }

    /// Declare an exchange and return it as the broker reports it
    pub async fn create_exchange(&self, name: &str, options: &ExchangeOptions) -> Result<Exchange<R>> {
        self.api
            .create_exchange(&self.data.name, name, options)
            .await?;
        info!("Created exchange {}:{}", self.data.name, name);
        self.exchange(name).await
    }

    /// Declare a queue and return it as the broker reports it
    pub async fn create_queue(&self, name: &str, options: &QueueOptions) -> Result<Queue<R>> {
        self.api.create_queue(&self.data.name, name, options).await?;
        info!("Created queue {}:{}", self.data.name, name);
        self.queue(name).await
    }

    /// Every binding in this vhost, without implicit default-exchange ones
    pub async fn bindings(&self) -> Result<Vec<Binding<R>>> {
        let items = self.api.vhost_bindings(&self.data.name).await?;
        let operation = describe(Method::Get, &["bindings", self.name()]);
        Ok(decode_listing(&operation, "source", items)?
            .into_iter()
            .map(|data| Binding::new(Arc::clone(&self.api), data))
            .collect())
    }

    pub async fn permissions(&self) -> Result<Vec<Value>> {
        self.api.vhost_permissions(&self.data.name).await
    }

    pub async fn topic_permissions(&self) -> Result<Vec<Value>> {
        self.api.vhost_topic_permissions(&self.data.name).await
    }

    pub async fn definitions(&self) -> Result<Map<String, Value>> {
        self.api.vhost_definitions(&self.data.name).await
    }

    /// Delete the vhost and everything in it
    pub async fn delete(&self) -> Result<()> {
        self.api.delete_vhost(&self.data.name).await?;
        info!("Deleted vhost {}", self.data.name);
        Ok(())
    }
}

fn object_operation(object: &Map<String, Value>) -> String {
    let name = object.get("name").and_then(Value::as_str).unwrap_or_default();
    describe(Method::Get, &["vhosts", name])
}

impl<R> Clone for VHost<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            data: self.data.clone(),
        }
    }
}

impl<R> fmt::Debug for VHost<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VHost").field("data", &self.data).finish()
    }
}

impl<R> fmt::Display for VHost<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<VHost {} - {}>",
            self.data.name,
            MetricsDisplay(&self.data.metrics)
        )
    }
}
