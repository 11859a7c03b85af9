//! Entry point tying the adapter to the entity model

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use rabbitmon_api::{describe, Api, Method, Requester};
use rabbitmon_core::prelude::*;
use rabbitmon_core::Version;

use crate::entity::{
    decode, decode_listing, Channel, ChannelData, Connection, ConnectionData, Exchange,
    ExchangeData, Node, NodeData, Queue, QueueData, User, UserData, VHost, VHostData,
};

/// Top-level view of a broker
///
/// Owns one [`Api`] and shares it with every entity it hands out. Every call
/// is a fresh round trip; only the management version is cached, by the
/// adapter.
pub struct Monitor<R> {
    api: Arc<Api<R>>,
}

impl<R: Requester> Monitor<R> {
    pub fn new(requester: R) -> Self {
        Self::from_api(Arc::new(Api::new(requester)))
    }

    pub fn from_api(api: Arc<Api<R>>) -> Self {
        Self { api }
    }

    /// The adapter, for endpoints without an entity wrapper
    pub fn api(&self) -> &Arc<Api<R>> {
        &self.api
    }

    pub async fn overview(&self) -> Result<Map<String, Value>> {
        self.api.overview().await
    }

    pub async fn management_version(&self) -> Result<Version> {
        self.api.management_version().await
    }

    pub async fn cluster_name(&self) -> Result<String> {
        let response = self.api.cluster_name().await?;
        response
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::protocol(
                    describe(Method::Get, &["cluster-name"]),
                    "missing string field \"name\"",
                )
            })
    }

    pub async fn set_cluster_name(&self, name: &str) -> Result<()> {
        self.api.set_cluster_name(name).await?;
        info!("Cluster renamed to {}", name);
        Ok(())
    }

    pub async fn extensions(&self) -> Result<Vec<Value>> {
        self.api.extensions().await
    }

    pub async fn definitions(&self) -> Result<Map<String, Value>> {
        self.api.definitions().await
    }

    pub async fn set_definitions(&self, definitions: &Value) -> Result<()> {
        self.api.set_definitions(definitions).await
    }

    /// Virtual hosts by name
    pub async fn vhosts(&self) -> Result<BTreeMap<String, VHost<R>>> {
        let items = self.api.vhosts().await?;
        let operation = describe(Method::Get, &["vhosts"]);
        Ok(decode_listing::<VHostData>(&operation, "name", items)?
            .into_iter()
            .map(|data| (data.name.clone(), VHost::new(Arc::clone(&self.api), data)))
            .collect())
    }

    pub async fn vhost(&self, name: &str) -> Result<VHost<R>> {
        let object = self.api.vhost(name).await?;
        VHost::from_object(Arc::clone(&self.api), object)
    }

    /// Create a vhost and return it as the broker reports it
    pub async fn create_vhost(&self, name: &str, tracing: bool) -> Result<VHost<R>> {
        self.api.create_vhost(name, tracing).await?;
        info!("Created vhost {}", name);
        self.vhost(name).await
    }

    /// Exchanges across every vhost, without the default exchanges
    pub async fn exchanges(&self) -> Result<Vec<Exchange<R>>> {
        let items = self.api.exchanges().await?;
        let operation = describe(Method::Get, &["exchanges"]);
        Ok(decode_listing::<ExchangeData>(&operation, "name", items)?
            .into_iter()
            .map(|data| Exchange::new(Arc::clone(&self.api), data))
            .collect())
    }

    /// Queues across every vhost
    pub async fn queues(&self) -> Result<Vec<Queue<R>>> {
        let items = self.api.queues().await?;
        let operation = describe(Method::Get, &["queues"]);
        Ok(decode_listing::<QueueData>(&operation, "name", items)?
            .into_iter()
            .map(|data| Queue::new(Arc::clone(&self.api), data))
            .collect())
    }

    pub async fn connections(&self) -> Result<Vec<Connection<R>>> {
        let items = self.api.connections().await?;
        let operation = describe(Method::Get, &["connections"]);
        Ok(decode_listing::<ConnectionData>(&operation, "name", items)?
            .into_iter()
            .map(|data| Connection::new(Arc::clone(&self.api), data))
            .collect())
    }

    pub async fn connection(&self, name: &str) -> Result<Connection<R>> {
        let object = self.api.connection(name).await?;
        Connection::from_object(Arc::clone(&self.api), name, object)
    }

    pub async fn channels(&self) -> Result<Vec<Channel<R>>> {
        let items = self.api.channels().await?;
        let operation = describe(Method::Get, &["channels"]);
        Ok(decode_listing::<ChannelData>(&operation, "name", items)?
            .into_iter()
            .map(|data| Channel::new(Arc::clone(&self.api), data))
            .collect())
    }

    pub async fn channel(&self, name: &str) -> Result<Channel<R>> {
        let object = self.api.channel(name).await?;
        Channel::from_object(Arc::clone(&self.api), name, object)
    }

    pub async fn nodes(&self) -> Result<Vec<Node<R>>> {
        let items = self.api.nodes().await?;
        let operation = describe(Method::Get, &["nodes"]);
        Ok(decode_listing::<NodeData>(&operation, "name", items)?
            .into_iter()
            .map(|data| Node::new(Arc::clone(&self.api), data))
            .collect())
    }

    pub async fn users(&self) -> Result<Vec<User>> {
        let items = self.api.users().await?;
        let operation = describe(Method::Get, &["users"]);
        items
            .into_iter()
            .map(|item| decode::<UserData>(&operation, item).map(User::new))
            .collect()
    }
}

impl<R> Clone for Monitor<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}
