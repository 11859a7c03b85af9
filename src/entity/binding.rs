use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use rabbitmon_api::{Api, DestinationType, Requester};
use rabbitmon_core::prelude::*;

use super::snapshot::{Metrics, MetricsDisplay};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingData {
    pub vhost: String,
    pub source: String,
    pub destination: String,
    /// `"queue"` or `"exchange"`; checked when the binding is addressed
    pub destination_type: String,
    #[serde(default)]
    pub routing_key: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
    #[serde(default)]
    pub properties_key: String,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// A routing rule from an exchange to a queue or another exchange
pub struct Binding<R> {
    api: Arc<Api<R>>,
    data: BindingData,
}

impl<R: Requester> Binding<R> {
    pub fn new(api: Arc<Api<R>>, data: BindingData) -> Self {
        Self { api, data }
    }

    pub fn vhost(&self) -> &str {
        &self.data.vhost
    }

    pub fn source(&self) -> &str {
        &self.data.source
    }

    pub fn destination(&self) -> &str {
        &self.data.destination
    }

    pub fn destination_type(&self) -> &str {
        &self.data.destination_type
    }

    pub fn routing_key(&self) -> &str {
        &self.data.routing_key
    }

    pub fn arguments(&self) -> &Map<String, Value> {
        &self.data.arguments
    }

    pub fn properties_key(&self) -> &str {
        &self.data.properties_key
    }

    pub fn metrics(&self) -> &Metrics {
        &self.data.metrics
    }

    pub fn data(&self) -> &BindingData {
        &self.data
    }

    /// Parsed destination type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] for anything but `queue` or `exchange`.
    pub fn destination_kind(&self) -> Result<DestinationType> {
        self.data.destination_type.parse()
    }

    /// Fetch this binding's properties
    pub async fn props(&self) -> Result<Value> {
        let kind = self.destination_kind()?;
        self.api
            .binding_props(
                self.vhost(),
                self.source(),
                self.destination(),
                kind,
                self.properties_key(),
            )
            .await
    }

    pub async fn delete(&self) -> Result<()> {
        let kind = self.destination_kind()?;
        self.api
            .delete_binding(
                self.vhost(),
                self.source(),
                self.destination(),
                kind,
                self.properties_key(),
            )
            .await?;
        info!(
            "Deleted binding {}:{} -> {} ({})",
            self.vhost(),
            self.source(),
            self.destination(),
            self.properties_key()
        );
        Ok(())
    }
}

impl<R> Clone for Binding<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            data: self.data.clone(),
        }
    }
}

impl<R> fmt::Debug for Binding<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding").field("data", &self.data).finish()
    }
}

impl<R> fmt::Display for Binding<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Binding {}:{} {}:{} {:?} - {}>",
            self.data.vhost,
            self.data.source,
            self.data.destination,
            self.data.destination_type,
            self.data.routing_key,
            MetricsDisplay(&self.data.metrics)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rabbitmon_api::test_utils::FakeRequester;
    use rabbitmon_api::Method;
    use serde_json::json;

    fn binding(fake: &FakeRequester, destination_type: &str) -> Binding<FakeRequester> {
        let api = Arc::new(Api::new(fake.clone()));
        let data = serde_json::from_value(json!({
            "source": "events", "vhost": "/", "destination": "audit",
            "destination_type": destination_type, "routing_key": "a.*",
            "arguments": {}, "properties_key": "a.*"
        }))
        .unwrap();
        Binding::new(api, data)
    }

    #[tokio::test]
    async fn test_props_dispatches_on_destination_type() {
        let fake = FakeRequester::new();
        fake.push_body(json!({ "routing_key": "a.*" }));
        fake.push_body(json!({ "routing_key": "a.*" }));

        binding(&fake, "queue").props().await.unwrap();
        binding(&fake, "exchange").props().await.unwrap();

        let calls = fake.calls();
        assert_eq!(calls[0].path, vec!["bindings", "/", "e", "events", "q", "audit", "a.*"]);
        assert_eq!(calls[1].path, vec!["bindings", "/", "e", "events", "e", "audit", "a.*"]);
    }

    #[tokio::test]
    async fn test_unknown_destination_type_is_invalid_state() {
        let fake = FakeRequester::new();

        let binding = binding(&fake, "stream");
        let err = binding.props().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
        let err = binding.delete().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_uses_properties_key() {
        let fake = FakeRequester::new();
        fake.push_empty();

        binding(&fake, "exchange").delete().await.unwrap();

        let call = &fake.calls()[0];
        assert_eq!(call.method, Method::Delete);
        assert_eq!(call.path.last().map(String::as_str), Some("a.*"));
    }

    #[test]
    fn test_destination_kind() {
        let fake = FakeRequester::new();
        assert_eq!(
            binding(&fake, "queue").destination_kind().unwrap(),
            DestinationType::Queue
        );
    }
}
