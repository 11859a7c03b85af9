use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use rabbitmon_api::{describe, Api, Method, Requester};
use rabbitmon_core::prelude::*;

use super::channel::{Channel, ChannelData};
use super::snapshot::{decode_listing, decode_object, lenient_port, Metrics, MetricsDisplay};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionData {
    #[serde(default)]
    pub node: String,
    pub vhost: String,
    pub name: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(rename = "type", default)]
    pub connection_type: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default, deserialize_with = "lenient_port")]
    pub port: Option<u16>,
    #[serde(default)]
    pub peer_host: Option<String>,
    #[serde(default, deserialize_with = "lenient_port")]
    pub peer_port: Option<u16>,
    #[serde(default)]
    pub client_properties: Map<String, Value>,
    #[serde(default)]
    pub auth_mechanism: Option<String>,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default)]
    pub ssl_hash: Option<String>,
    #[serde(default)]
    pub ssl_cipher: Option<String>,
    #[serde(default)]
    pub ssl_protocol: Option<String>,
    #[serde(default)]
    pub peer_cert_validity: Option<String>,
    #[serde(default)]
    pub peer_cert_issuer: Option<String>,
    #[serde(default)]
    pub peer_cert_subject: Option<String>,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// A client connection to the broker
pub struct Connection<R> {
    api: Arc<Api<R>>,
    data: ConnectionData,
}

impl<R: Requester> Connection<R> {
    pub fn new(api: Arc<Api<R>>, data: ConnectionData) -> Self {
        Self { api, data }
    }

    pub(crate) fn from_object(
        api: Arc<Api<R>>,
        name: &str,
        object: Map<String, Value>,
    ) -> Result<Self> {
        let data = decode_object(&describe(Method::Get, &["connections", name]), object)?;
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

    pub fn user(&self) -> &str {
        &self.data.user
    }

    pub fn protocol(&self) -> &str {
        &self.data.protocol
    }

    /// `network` or `direct`
    pub fn connection_type(&self) -> &str {
        &self.data.connection_type
    }

    pub fn peer(&self) -> Option<(&str, u16)> {
        Some((self.data.peer_host.as_deref()?, self.data.peer_port?))
    }

    pub fn client_properties(&self) -> &Map<String, Value> {
        &self.data.client_properties
    }

    pub fn ssl(&self) -> bool {
        self.data.ssl
    }

    pub fn metrics(&self) -> &Metrics {
        &self.data.metrics
    }

    /// All typed fields, including host, port and TLS details
    pub fn data(&self) -> &ConnectionData {
        &self.data
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let object = self.api.connection(self.name()).await?;
        let operation = describe(Method::Get, &["connections", self.name()]);
        self.data = decode_object(&operation, object)?;
        Ok(())
    }

    pub async fn channels(&self) -> Result<Vec<Channel<R>>> {
        let items = self.api.connection_channels(self.name()).await?;
        let operation = describe(Method::Get, &["connections", self.name(), "channels"]);
        Ok(decode_listing::<ChannelData>(&operation, "name", items)?
            .into_iter()
            .map(|data| Channel::new(Arc::clone(&self.api), data))
            .collect())
    }

    /// Force the connection closed
    pub async fn close(&self) -> Result<()> {
        self.api.delete_connection(self.name()).await?;
        info!("Closed connection {}", self.name());
        Ok(())
    }
}

impl<R> Clone for Connection<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            data: self.data.clone(),
        }
    }
}

impl<R> fmt::Debug for Connection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("data", &self.data).finish()
    }
}

impl<R> fmt::Display for Connection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Connection {} {}:{} - {}>",
            self.data.node,
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

    const NAME: &str = "172.17.0.1:50012 -> 172.17.0.2:5672";

    fn connection(fake: &FakeRequester) -> Connection<FakeRequester> {
        let api = Arc::new(Api::new(fake.clone()));
        let data = serde_json::from_value(json!({
            "node": "rabbit@a", "vhost": "/", "name": NAME, "user": "guest",
            "protocol": "AMQP 0-9-1", "type": "network", "host": "172.17.0.2",
            "port": 5672, "peer_host": "172.17.0.1", "peer_port": 50012,
            "client_properties": { "product": "pika" }, "auth_mechanism": "PLAIN",
            "ssl": false, "ssl_hash": null, "ssl_cipher": null, "ssl_protocol": null,
            "peer_cert_validity": null, "peer_cert_issuer": null,
            "peer_cert_subject": null, "channels": 2
        }))
        .unwrap();
        Connection::new(api, data)
    }

    #[test]
    fn test_typed_fields() {
        let connection = connection(&FakeRequester::new());
        assert_eq!(connection.connection_type(), "network");
        assert_eq!(connection.peer(), Some(("172.17.0.1", 50012)));
        assert_eq!(connection.metrics()["channels"], json!(2));
        assert!(!connection.metrics().contains_key("ssl"));
    }

    #[test]
    fn test_direct_connection_ports() {
        let data: ConnectionData = serde_json::from_value(json!({
            "vhost": "/", "name": "<rabbit@a.1.2.3>", "type": "direct",
            "port": "unknown", "peer_port": "unknown"
        }))
        .unwrap();
        assert_eq!(data.port, None);
        assert_eq!(data.peer_port, None);
    }

    #[tokio::test]
    async fn test_channels_and_close() {
        let fake = FakeRequester::new();
        fake.push_body(json!([
            { "node": "rabbit@a", "vhost": "/", "name": format!("{NAME} (1)"), "number": 1 },
            { "node": "rabbit@a", "vhost": "/", "name": format!("{NAME} (2)"), "number": 2 }
        ]));
        fake.push_empty();

        let connection = connection(&fake);
        let channels = connection.channels().await.unwrap();
        connection.close().await.unwrap();

        assert_eq!(channels.len(), 2);
        assert_eq!(channels[1].number(), 2);
        let calls = fake.calls();
        assert_eq!(calls[0].path, vec!["connections", NAME, "channels"]);
        assert_eq!(calls[1].method, Method::Delete);
        assert_eq!(calls[1].path, vec!["connections", NAME]);
    }
}
