use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use rabbitmon_api::{describe, Api, DestinationType, Method, Publish, Requester};
use rabbitmon_core::prelude::*;

use super::binding::{Binding, BindingData};
use super::snapshot::{decode, decode_listing, decode_object, Metrics, MetricsDisplay};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeData {
    pub vhost: String,
    pub name: String,
    #[serde(rename = "type")]
    pub exchange_type: String,
    #[serde(default)]
    pub durable: bool,
    #[serde(default)]
    pub auto_delete: bool,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub arguments: Map<String, Value>,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// An exchange within a vhost
pub struct Exchange<R> {
    api: Arc<Api<R>>,
    data: ExchangeData,
}

impl<R: Requester> Exchange<R> {
    pub fn new(api: Arc<Api<R>>, data: ExchangeData) -> Self {
        Self { api, data }
    }

    pub(crate) fn from_object(
        api: Arc<Api<R>>,
        vhost: &str,
        name: &str,
        object: Map<String, Value>,
    ) -> Result<Self> {
        let data = decode_object(&describe(Method::Get, &["exchanges", vhost, name]), object)?;
        Ok(Self::new(api, data))
    }

    pub fn vhost(&self) -> &str {
        &self.data.vhost
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn exchange_type(&self) -> &str {
        &self.data.exchange_type
    }

    pub fn durable(&self) -> bool {
        self.data.durable
    }

    pub fn auto_delete(&self) -> bool {
        self.data.auto_delete
    }

    pub fn internal(&self) -> bool {
        self.data.internal
    }

    pub fn arguments(&self) -> &Map<String, Value> {
        &self.data.arguments
    }

    pub fn metrics(&self) -> &Metrics {
        &self.data.metrics
    }

    pub fn data(&self) -> &ExchangeData {
        &self.data
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let object = self.api.exchange(self.vhost(), self.name()).await?;
        let operation = describe(Method::Get, &["exchanges", self.vhost(), self.name()]);
        self.data = decode_object(&operation, object)?;
        Ok(())
    }

    /// Bindings with this exchange as the source
    pub async fn bindings(&self) -> Result<Vec<Binding<R>>> {
        let items = self
            .api
            .exchange_bindings_source(self.vhost(), self.name())
            .await?;
        let operation = describe(
            Method::Get,
            &["exchanges", self.vhost(), self.name(), "bindings", "source"],
        );
        self.wrap_bindings(&operation, items)
    }

    /// Bindings with this exchange as the destination
    pub async fn destination_bindings(&self) -> Result<Vec<Binding<R>>> {
        let items = self
            .api
            .exchange_bindings_destination(self.vhost(), self.name())
            .await?;
        let operation = describe(
            Method::Get,
            &["exchanges", self.vhost(), self.name(), "bindings", "destination"],
        );
        self.wrap_bindings(&operation, items)
    }

    fn wrap_bindings(&self, operation: &str, items: Vec<Value>) -> Result<Vec<Binding<R>>> {
        Ok(decode_listing::<BindingData>(operation, "source", items)?
            .into_iter()
            .map(|data| Binding::new(Arc::clone(&self.api), data))
            .collect())
    }

    /// Bind `destination` to this exchange and return the new binding.
    ///
    /// The broker answers the create with no body, so the binding is read
    /// back from the listing between the two ends.
    pub async fn create_binding(
        &self,
        destination: &str,
        kind: DestinationType,
        routing_key: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Binding<R>> {
        self.api
            .create_binding(
                self.vhost(),
                self.name(),
                destination,
                kind,
                routing_key,
                arguments,
            )
            .await?;

        let items = self
            .api
            .bindings_between(self.vhost(), self.name(), destination, kind)
            .await?;
        let operation = describe(
            Method::Get,
            &[
                "bindings",
                self.vhost(),
                "e",
                self.name(),
                kind.path_segment(),
                destination,
            ],
        );

        for item in items {
            let data: BindingData = decode(&operation, item)?;
            if data.routing_key == routing_key && &data.arguments == arguments {
                info!(
                    "Bound {} {} to {}:{} with {:?}",
                    kind,
                    destination,
                    self.vhost(),
                    self.name(),
                    routing_key
                );
                return Ok(Binding::new(Arc::clone(&self.api), data));
            }
        }

        Err(Error::protocol(
            operation,
            format!("created binding with routing key {routing_key:?} not listed"),
        ))
    }

    /// Remove one binding from this exchange, addressed by properties key
    pub async fn delete_binding(
        &self,
        destination: &str,
        kind: DestinationType,
        properties_key: &str,
    ) -> Result<()> {
        self.api
            .delete_binding(self.vhost(), self.name(), destination, kind, properties_key)
            .await
    }

    /// Delete the exchange; with `if_unused` the broker refuses while it
    /// still has bindings.
    pub async fn delete(&self, if_unused: bool) -> Result<()> {
        self.api
            .delete_exchange(self.vhost(), self.name(), if_unused)
            .await?;
        info!("Deleted exchange {}:{}", self.vhost(), self.name());
        Ok(())
    }

    /// Publish a message; returns whether any queue received it
    pub async fn publish(&self, message: &Publish) -> Result<bool> {
        self.api.publish(self.vhost(), self.name(), message).await
    }
}

impl<R> Clone for Exchange<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            data: self.data.clone(),
        }
    }
}

impl<R> fmt::Debug for Exchange<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange").field("data", &self.data).finish()
    }
}

impl<R> fmt::Display for Exchange<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Exchange {}:{} - {}>",
            self.data.vhost,
            self.data.name,
            MetricsDisplay(&self.data.metrics)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rabbitmon_api::test_utils::FakeRequester;
    use serde_json::json;

    fn exchange(fake: &FakeRequester) -> Exchange<FakeRequester> {
        let api = Arc::new(Api::new(fake.clone()));
        let data = serde_json::from_value(json!({
            "vhost": "prd", "name": "test_exchange", "type": "topic",
            "durable": true, "auto_delete": false, "internal": false, "arguments": {}
        }))
        .unwrap();
        Exchange::new(api, data)
    }

    fn binding_json(routing_key: &str, properties_key: &str) -> Value {
        json!({
            "source": "test_exchange", "vhost": "prd", "destination": "jobs",
            "destination_type": "queue", "routing_key": routing_key,
            "arguments": {}, "properties_key": properties_key
        })
    }

    #[test]
    fn test_typed_fields_and_metrics() {
        let fake = FakeRequester::new();
        let exchange = exchange(&fake);
        assert_eq!(exchange.exchange_type(), "topic");
        assert!(exchange.durable());
        assert!(exchange.metrics().is_empty());
        assert_eq!(exchange.to_string(), "<Exchange prd:test_exchange - {}>");
    }

    #[tokio::test]
    async fn test_create_binding_reads_back_match() {
        let fake = FakeRequester::new();
        fake.push_empty();
        fake.push_body(json!([
            binding_json("other.key", "other.key"),
            binding_json("test.#", "test.%23"),
        ]));

        let binding = exchange(&fake)
            .create_binding("jobs", DestinationType::Queue, "test.#", &Map::new())
            .await
            .unwrap();

        assert_eq!(binding.routing_key(), "test.#");
        assert_eq!(binding.properties_key(), "test.%23");

        let calls = fake.calls();
        assert_eq!(calls[0].method, Method::Post);
        assert_eq!(
            calls[0].path,
            vec!["bindings", "prd", "e", "test_exchange", "q", "jobs"]
        );
        assert_eq!(
            calls[0].body,
            Some(json!({ "routing_key": "test.#", "arguments": {} }))
        );
        assert_eq!(calls[1].method, Method::Get);
    }

    #[tokio::test]
    async fn test_create_binding_missing_from_listing() {
        let fake = FakeRequester::new();
        fake.push_empty();
        fake.push_body(json!([binding_json("other.key", "other.key")]));

        let err = exchange(&fake)
            .create_binding("jobs", DestinationType::Queue, "test.#", &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[tokio::test]
    async fn test_delete_sends_if_unused() {
        let fake = FakeRequester::new();
        fake.push_empty();

        exchange(&fake).delete(true).await.unwrap();

        let call = &fake.calls()[0];
        assert_eq!(call.method, Method::Delete);
        assert_eq!(call.path, vec!["exchanges", "prd", "test_exchange"]);
        assert_eq!(
            call.query.as_ref().unwrap().pairs(),
            &[("if-unused".to_string(), "true".to_string())]
        );
    }

    #[tokio::test]
    async fn test_refresh_after_delete_is_not_found() {
        let fake = FakeRequester::new();
        fake.push_status(404);

        let mut exchange = exchange(&fake);
        let err = exchange.refresh().await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(exchange.name(), "test_exchange");
    }

    #[tokio::test]
    async fn test_destination_bindings_path() {
        let fake = FakeRequester::new();
        fake.push_body(json!([]));

        let bindings = exchange(&fake).destination_bindings().await.unwrap();
        assert!(bindings.is_empty());
        assert_eq!(
            fake.calls()[0].path,
            vec!["exchanges", "prd", "test_exchange", "bindings", "destination"]
        );
    }
}
