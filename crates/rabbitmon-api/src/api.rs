//! Protocol adapter for the management API
//!
//! [`Api`] is the single place that turns an intention ("list the queues of
//! `prd`") into a transport call and interprets the answer. Every endpoint
//! declares what it expects back:
//!
//! - reads expect a JSON object or list; an empty body is a
//!   [`Error::Protocol`],
//! - writes expect an empty body; any returned data is a [`Error::Protocol`].
//!
//! The adapter also owns management version detection, which selects the
//! request dialect for fetching messages (see [`crate::dialect`]).

use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

use rabbitmon_core::prelude::*;
use rabbitmon_core::Version;

use crate::dialect::MessageDialect;
use crate::options::{
    DestinationType, ExchangeOptions, GetMessages, Publish, QueueAction, QueueOptions,
};
use crate::transport::{describe, Method, Query, Requester};

/// Field of the overview object holding the management plugin version
const MANAGEMENT_VERSION_FIELD: &str = "management_version";

/// Version-aware adapter over a [`Requester`]
///
/// Holds no mutable state apart from the memoized management version. It is
/// usually shared between entities behind an `Arc`.
pub struct Api<R> {
    requester: R,

    /// Cached management version (fetched once via `GET overview`).
    ///
    /// Never invalidated; build a new adapter to force a fresh check.
    version_cache: Mutex<Option<Version>>,
}

impl<R: Requester> Api<R> {
    pub fn new(requester: R) -> Self {
        Self {
            requester,
            version_cache: Mutex::new(None),
        }
    }

    /// Create an adapter that already knows the management version, so the
    /// first message fetch needs no `GET overview` round trip.
    pub fn with_management_version(requester: R, version: Version) -> Self {
        Self {
            requester,
            version_cache: Mutex::new(Some(version)),
        }
    }

    pub fn requester(&self) -> &R {
        &self.requester
    }

    // ─────────────────────────────────────────────────────────
    // Response expectations
    // ─────────────────────────────────────────────────────────

    async fn send(
        &self,
        method: Method,
        path: &[&str],
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> Result<Option<Value>> {
        debug!("Management API: {}", describe(method, path));
        self.requester.request(method, path, body, query).await
    }

    /// Any JSON value; absence is a protocol error
    async fn expect_value(
        &self,
        method: Method,
        path: &[&str],
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> Result<Value> {
        match self.send(method, path, body, query).await? {
            Some(value) => Ok(value),
            None => {
                let operation = describe(method, path);
                warn!("Management API: {} returned no body", operation);
                Err(Error::protocol(operation, "expected a response body, got none"))
            }
        }
    }

    async fn expect_object(
        &self,
        method: Method,
        path: &[&str],
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> Result<Map<String, Value>> {
        match self.expect_value(method, path, body, query).await? {
            Value::Object(map) => Ok(map),
            other => Err(Error::protocol(
                describe(method, path),
                format!("expected an object, got {}", json_kind(&other)),
            )),
        }
    }

    async fn expect_list(
        &self,
        method: Method,
        path: &[&str],
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> Result<Vec<Value>> {
        match self.expect_value(method, path, body, query).await? {
            Value::Array(items) => Ok(items),
            other => Err(Error::protocol(
                describe(method, path),
                format!("expected a list, got {}", json_kind(&other)),
            )),
        }
    }

    async fn expect_empty(
        &self,
        method: Method,
        path: &[&str],
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> Result<()> {
        match self.send(method, path, body, query).await? {
            None => Ok(()),
            Some(value) => {
                let operation = describe(method, path);
                warn!("Management API: {} returned unexpected data", operation);
                Err(Error::protocol(
                    operation,
                    format!("expected an empty response, got {value}"),
                ))
            }
        }
    }

    // ─────────────────────────────────────────────────────────
    // Cluster
    // ─────────────────────────────────────────────────────────

    /// `GET overview`
    pub async fn overview(&self) -> Result<Map<String, Value>> {
        self.expect_object(Method::Get, &["overview"], None, None)
            .await
    }

    /// The management plugin version, detected once from the overview.
    ///
    /// Two concurrent first calls may both fetch the overview; they store the
    /// same value.
    pub async fn management_version(&self) -> Result<Version> {
        // Fast path: return from cache if available.
        {
            let guard = self.version_cache.lock().await;
            if let Some(ref version) = *guard {
                return Ok(version.clone());
            }
        }

        // Slow path: read it from the overview.
        let overview = self.overview().await?;
        let text = overview
            .get(MANAGEMENT_VERSION_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::protocol(
                    describe(Method::Get, &["overview"]),
                    format!("missing string field {MANAGEMENT_VERSION_FIELD:?}"),
                )
            })?;
        let version = Version::parse(text, Some(0))?;

        {
            let mut guard = self.version_cache.lock().await;
            *guard = Some(version.clone());
        }

        debug!("Management API: cached management version {}", version);
        Ok(version)
    }

    /// Version cached so far, without a round trip
    pub fn cached_management_version(&self) -> Option<Version> {
        self.version_cache
            .try_lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    pub async fn cluster_name(&self) -> Result<Map<String, Value>> {
        self.expect_object(Method::Get, &["cluster-name"], None, None)
            .await
    }

    pub async fn set_cluster_name(&self, name: &str) -> Result<()> {
        let body = json!({ "name": name });
        self.expect_empty(Method::Put, &["cluster-name"], Some(&body), None)
            .await
    }

    pub async fn nodes(&self) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["nodes"], None, None).await
    }

    /// One node; `memory` and `binary` request the (expensive) memory
    /// breakdowns.
    pub async fn node(&self, name: &str, memory: bool, binary: bool) -> Result<Map<String, Value>> {
        let query = Query::new()
            .with_flag("memory", memory)
            .with_flag("binary", binary);
        self.expect_object(Method::Get, &["nodes", name], None, Some(&query))
            .await
    }

    pub async fn extensions(&self) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["extensions"], None, None)
            .await
    }

    pub async fn definitions(&self) -> Result<Map<String, Value>> {
        self.expect_object(Method::Get, &["definitions"], None, None)
            .await
    }

    /// Upload definitions; the broker merges them with what exists.
    pub async fn set_definitions(&self, definitions: &Value) -> Result<()> {
        self.expect_empty(Method::Put, &["definitions"], Some(definitions), None)
            .await
    }

    pub async fn vhost_definitions(&self, vhost: &str) -> Result<Map<String, Value>> {
        self.expect_object(Method::Get, &["definitions", vhost], None, None)
            .await
    }

    pub async fn users(&self) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["users"], None, None).await
    }

    // ─────────────────────────────────────────────────────────
    // Connections, channels and consumers
    // ─────────────────────────────────────────────────────────

    pub async fn connections(&self) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["connections"], None, None)
            .await
    }

    pub async fn vhost_connections(&self, vhost: &str) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["vhosts", vhost, "connections"], None, None)
            .await
    }

    pub async fn connection(&self, name: &str) -> Result<Map<String, Value>> {
        self.expect_object(Method::Get, &["connections", name], None, None)
            .await
    }

    /// Close a connection
    pub async fn delete_connection(&self, name: &str) -> Result<()> {
        self.expect_empty(Method::Delete, &["connections", name], None, None)
            .await
    }

    pub async fn connection_channels(&self, name: &str) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["connections", name, "channels"], None, None)
            .await
    }

    pub async fn channels(&self) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["channels"], None, None)
            .await
    }

    pub async fn vhost_channels(&self, vhost: &str) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["vhosts", vhost, "channels"], None, None)
            .await
    }

    pub async fn channel(&self, name: &str) -> Result<Map<String, Value>> {
        self.expect_object(Method::Get, &["channels", name], None, None)
            .await
    }

    pub async fn consumers(&self) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["consumers"], None, None)
            .await
    }

    pub async fn vhost_consumers(&self, vhost: &str) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["consumers", vhost], None, None)
            .await
    }

    // ─────────────────────────────────────────────────────────
    // Exchanges
    // ─────────────────────────────────────────────────────────

    pub async fn exchanges(&self) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["exchanges"], None, None)
            .await
    }

    pub async fn vhost_exchanges(&self, vhost: &str) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["exchanges", vhost], None, None)
            .await
    }

    pub async fn exchange(&self, vhost: &str, name: &str) -> Result<Map<String, Value>> {
        self.expect_object(Method::Get, &["exchanges", vhost, name], None, None)
            .await
    }

    pub async fn create_exchange(
        &self,
        vhost: &str,
        name: &str,
        options: &ExchangeOptions,
    ) -> Result<()> {
        let body = serde_json::to_value(options)?;
        self.expect_empty(Method::Put, &["exchanges", vhost, name], Some(&body), None)
            .await
    }

    pub async fn delete_exchange(&self, vhost: &str, name: &str, if_unused: bool) -> Result<()> {
        let query = Query::new().with_flag("if-unused", if_unused);
        self.expect_empty(
            Method::Delete,
            &["exchanges", vhost, name],
            None,
            Some(&query),
        )
        .await
    }

    /// Bindings where the exchange is the source
    pub async fn exchange_bindings_source(&self, vhost: &str, name: &str) -> Result<Vec<Value>> {
        self.expect_list(
            Method::Get,
            &["exchanges", vhost, name, "bindings", "source"],
            None,
            None,
        )
        .await
    }

    /// Bindings where the exchange is the destination
    pub async fn exchange_bindings_destination(
        &self,
        vhost: &str,
        name: &str,
    ) -> Result<Vec<Value>> {
        self.expect_list(
            Method::Get,
            &["exchanges", vhost, name, "bindings", "destination"],
            None,
            None,
        )
        .await
    }

    /// Publish through an exchange. Returns the broker's `routed` flag: true
    /// if at least one queue received the message.
    pub async fn publish(&self, vhost: &str, name: &str, message: &Publish) -> Result<bool> {
        let path = ["exchanges", vhost, name, "publish"];
        let body = serde_json::to_value(message)?;
        let response = self
            .expect_object(Method::Post, &path, Some(&body), None)
            .await?;
        response
            .get("routed")
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                Error::protocol(describe(Method::Post, &path), "missing boolean field \"routed\"")
            })
    }

    // ─────────────────────────────────────────────────────────
    // Queues
    // ─────────────────────────────────────────────────────────

    pub async fn queues(&self) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["queues"], None, None).await
    }

    pub async fn vhost_queues(&self, vhost: &str) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["queues", vhost], None, None)
            .await
    }

    pub async fn queue(&self, vhost: &str, name: &str) -> Result<Map<String, Value>> {
        self.expect_object(Method::Get, &["queues", vhost, name], None, None)
            .await
    }

    pub async fn create_queue(&self, vhost: &str, name: &str, options: &QueueOptions) -> Result<()> {
        let body = serde_json::to_value(options)?;
        self.expect_empty(Method::Put, &["queues", vhost, name], Some(&body), None)
            .await
    }

    pub async fn delete_queue(
        &self,
        vhost: &str,
        name: &str,
        if_empty: bool,
        if_unused: bool,
    ) -> Result<()> {
        let query = Query::new()
            .with_flag("if-empty", if_empty)
            .with_flag("if-unused", if_unused);
        self.expect_empty(Method::Delete, &["queues", vhost, name], None, Some(&query))
            .await
    }

    pub async fn queue_bindings(&self, vhost: &str, name: &str) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["queues", vhost, name, "bindings"], None, None)
            .await
    }

    /// Drop every ready message of a queue
    pub async fn purge_queue(&self, vhost: &str, name: &str) -> Result<()> {
        self.expect_empty(
            Method::Delete,
            &["queues", vhost, name, "contents"],
            None,
            None,
        )
        .await
    }

    pub async fn queue_action(&self, vhost: &str, name: &str, action: QueueAction) -> Result<()> {
        let body = json!({ "action": action });
        self.expect_empty(
            Method::Post,
            &["queues", vhost, name, "actions"],
            Some(&body),
            None,
        )
        .await
    }

    /// Fetch messages from a queue.
    ///
    /// The request body follows the dialect of the detected management
    /// version. Combinations the dialect cannot express fail before the
    /// `POST` is sent.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedVersion`] for management versions below 3.6.
    /// - [`Error::UnsupportedOperation`] for `reject` below 3.7.
    pub async fn queue_messages(
        &self,
        vhost: &str,
        name: &str,
        request: &GetMessages,
    ) -> Result<Vec<Value>> {
        let version = self.management_version().await?;
        let dialect = MessageDialect::for_version(&version)?;
        let body = dialect.body(vhost, name, request)?;
        self.expect_list(
            Method::Post,
            &["queues", vhost, name, "get"],
            Some(&body),
            None,
        )
        .await
    }

    // ─────────────────────────────────────────────────────────
    // Bindings
    // ─────────────────────────────────────────────────────────

    pub async fn bindings(&self) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["bindings"], None, None)
            .await
    }

    pub async fn vhost_bindings(&self, vhost: &str) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["bindings", vhost], None, None)
            .await
    }

    /// Every binding from `source` to `destination`. An exchange and a queue
    /// may be bound several times with different keys.
    pub async fn bindings_between(
        &self,
        vhost: &str,
        source: &str,
        destination: &str,
        kind: DestinationType,
    ) -> Result<Vec<Value>> {
        let path = binding_path(vhost, source, destination, kind);
        self.expect_list(Method::Get, &path, None, None).await
    }

    pub async fn create_binding(
        &self,
        vhost: &str,
        source: &str,
        destination: &str,
        kind: DestinationType,
        routing_key: &str,
        arguments: &Map<String, Value>,
    ) -> Result<()> {
        let path = binding_path(vhost, source, destination, kind);
        let body = json!({
            "routing_key": routing_key,
            "arguments": arguments,
        });
        self.expect_empty(Method::Post, &path, Some(&body), None)
            .await
    }

    /// One binding, addressed by its `properties_key`
    pub async fn binding_props(
        &self,
        vhost: &str,
        source: &str,
        destination: &str,
        kind: DestinationType,
        props: &str,
    ) -> Result<Value> {
        let path = binding_props_path(vhost, source, destination, kind, props);
        self.expect_value(Method::Get, &path, None, None).await
    }

    pub async fn delete_binding(
        &self,
        vhost: &str,
        source: &str,
        destination: &str,
        kind: DestinationType,
        props: &str,
    ) -> Result<()> {
        let path = binding_props_path(vhost, source, destination, kind, props);
        self.expect_empty(Method::Delete, &path, None, None).await
    }

    // ─────────────────────────────────────────────────────────
    // Virtual hosts
    // ─────────────────────────────────────────────────────────

    pub async fn vhosts(&self) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["vhosts"], None, None).await
    }

    pub async fn vhost(&self, name: &str) -> Result<Map<String, Value>> {
        self.expect_object(Method::Get, &["vhosts", name], None, None)
            .await
    }

    pub async fn create_vhost(&self, name: &str, tracing: bool) -> Result<()> {
        let body = json!({ "tracing": tracing });
        self.expect_empty(Method::Put, &["vhosts", name], Some(&body), None)
            .await
    }

    pub async fn delete_vhost(&self, name: &str) -> Result<()> {
        self.expect_empty(Method::Delete, &["vhosts", name], None, None)
            .await
    }

    pub async fn vhost_permissions(&self, name: &str) -> Result<Vec<Value>> {
        self.expect_list(Method::Get, &["vhosts", name, "permissions"], None, None)
            .await
    }

    pub async fn vhost_topic_permissions(&self, name: &str) -> Result<Vec<Value>> {
        self.expect_list(
            Method::Get,
            &["vhosts", name, "topic-permissions"],
            None,
            None,
        )
        .await
    }
}

fn binding_path<'a>(
    vhost: &'a str,
    source: &'a str,
    destination: &'a str,
    kind: DestinationType,
) -> [&'a str; 6] {
    ["bindings", vhost, "e", source, kind.path_segment(), destination]
}

fn binding_props_path<'a>(
    vhost: &'a str,
    source: &'a str,
    destination: &'a str,
    kind: DestinationType,
    props: &'a str,
) -> [&'a str; 7] {
    [
        "bindings",
        vhost,
        "e",
        source,
        kind.path_segment(),
        destination,
        props,
    ]
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
