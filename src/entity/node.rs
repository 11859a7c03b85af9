use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use rabbitmon_api::{describe, Api, Method, Requester};
use rabbitmon_core::prelude::*;

use super::snapshot::{decode_object, Metrics, MetricsDisplay};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub name: String,
    /// `disc` or `ram`
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// A broker node of the cluster
pub struct Node<R> {
    api: Arc<Api<R>>,
    data: NodeData,
}

impl<R: Requester> Node<R> {
    pub fn new(api: Arc<Api<R>>, data: NodeData) -> Self {
        Self { api, data }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn node_type(&self) -> &str {
        &self.data.node_type
    }

    pub fn metrics(&self) -> &Metrics {
        &self.data.metrics
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Re-read the node. `memory` adds a memory breakdown, `binary` a
    /// breakdown of binary memory use (expensive with many small binaries).
    pub async fn refresh(&mut self, memory: bool, binary: bool) -> Result<()> {
        let object = self.api.node(self.name(), memory, binary).await?;
        let operation = describe(Method::Get, &["nodes", self.name()]);
        self.data = decode_object(&operation, object)?;
        Ok(())
    }
}

impl<R> Clone for Node<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            data: self.data.clone(),
        }
    }
}

impl<R> fmt::Debug for Node<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node").field("data", &self.data).finish()
    }
}

impl<R> fmt::Display for Node<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Node {}:{} - {}>",
            self.data.name,
            self.data.node_type,
            MetricsDisplay(&self.data.metrics)
        )
    }
}
