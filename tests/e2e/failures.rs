//! How broker and transport failures surface through the monitor

use serde_json::{json, Map};

use rabbitmon::{DestinationType, Error};
use rabbitmon_api::test_utils::FakeRequester;

use crate::{binding_json, exchange_json, test_monitor, vhost_json};

#[tokio::test]
async fn test_missing_overview_body_is_protocol_error() {
    let fake = FakeRequester::new();
    fake.push_empty();

    let err = test_monitor(&fake).overview().await.unwrap_err();

    assert!(matches!(err, Error::Protocol { .. }));
    assert_eq!(err.operation(), Some("GET overview"));
    assert_eq!(fake.call_count(), 1);
}

#[tokio::test]
async fn test_version_detection_failure_is_not_cached() {
    let fake = FakeRequester::new();
    fake.push_body(json!({ "cluster_name": "rabbit@prd" }));
    fake.push_body(json!({ "management_version": "3.9.1" }));

    let monitor = test_monitor(&fake);
    let err = monitor.management_version().await.unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }));
    assert!(monitor.api().cached_management_version().is_none());

    let version = monitor.management_version().await.unwrap();
    assert_eq!(version.to_string(), "3.9.1");
    assert_eq!(fake.call_count(), 2);
}

#[tokio::test]
async fn test_write_with_body_is_protocol_error() {
    let fake = FakeRequester::new();
    fake.push_body(json!({ "error": "unexpected" }));

    let err = test_monitor(&fake)
        .create_vhost("prd", false)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol { .. }));
    assert_eq!(err.operation(), Some("PUT vhosts/prd"));
    // no confirming read after a failed write
    assert_eq!(fake.call_count(), 1);
}

#[tokio::test]
async fn test_server_error_is_transport_error() {
    let fake = FakeRequester::new();
    fake.push_status(500);

    let err = test_monitor(&fake).queues().await.unwrap_err();

    assert!(matches!(err, Error::Transport { .. }));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_missing_vhost_is_not_found() {
    let fake = FakeRequester::new();
    fake.push_status(404);

    let err = test_monitor(&fake).vhost("gone").await.unwrap_err();

    assert!(matches!(err, Error::NotFound { .. }));
    assert_eq!(err.operation(), Some("GET vhosts/gone"));
}

#[tokio::test]
async fn test_listing_with_wrong_shape_is_protocol_error() {
    let fake = FakeRequester::new();
    fake.push_body(json!({ "name": "prd" }));

    let err = test_monitor(&fake).vhosts().await.unwrap_err();

    assert!(matches!(err, Error::Protocol { .. }));
}

#[tokio::test]
async fn test_malformed_entity_is_decode_error() {
    let fake = FakeRequester::new();
    fake.push_body(vhost_json("prd"));
    fake.push_body(json!({ "vhost": "prd", "name": "jobs", "durable": "yes" }));

    let vhost = test_monitor(&fake).vhost("prd").await.unwrap();
    let err = vhost.queue("jobs").await.unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
    assert_eq!(err.operation(), Some("GET queues/prd/jobs"));
}

#[tokio::test]
async fn test_unconfirmed_binding_is_protocol_error() {
    let fake = FakeRequester::new();
    fake.push_body(vhost_json("prd"));
    fake.push_body(exchange_json("prd", "test_exchange", "topic"));
    fake.push_empty();
    // the broker reports a different routing key between the two
    fake.push_body(json!([binding_json(
        "prd",
        "test_exchange",
        "jobs",
        "audit.#"
    )]));

    let vhost = test_monitor(&fake).vhost("prd").await.unwrap();
    let exchange = vhost.exchange("test_exchange").await.unwrap();
    let err = exchange
        .create_binding("jobs", DestinationType::Queue, "test.#", &Map::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol { .. }));
    assert_eq!(fake.remaining(), 0);
}

#[tokio::test]
async fn test_missing_routed_flag_is_protocol_error() {
    let fake = FakeRequester::new();
    fake.push_body(vhost_json("prd"));
    fake.push_body(exchange_json("prd", "test_exchange", "topic"));
    fake.push_body(json!({}));

    let vhost = test_monitor(&fake).vhost("prd").await.unwrap();
    let exchange = vhost.exchange("test_exchange").await.unwrap();
    let err = exchange
        .publish(&rabbitmon::Publish::text("test.created", "{}"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol { .. }));
    assert_eq!(err.operation(), Some("POST exchanges/prd/test_exchange/publish"));
}
