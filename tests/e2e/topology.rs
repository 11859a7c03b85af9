//! Topology workflows: vhosts, exchanges, queues and bindings

use serde_json::{json, Map};

use rabbitmon::{DestinationType, ExchangeOptions, QueueOptions};
use rabbitmon_api::test_utils::FakeRequester;
use rabbitmon_api::Method;

use crate::{binding_json, exchange_json, load_fixture, queue_json, test_monitor, vhost_json};

// ─────────────────────────────────────────────────────────
// Full Scenario
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_vhost_exchange_and_binding() {
    let fake = FakeRequester::new();
    let monitor = test_monitor(&fake);

    // create vhost: PUT then confirming GET
    fake.push_empty();
    fake.push_body(vhost_json("prd"));
    let vhost = monitor.create_vhost("prd", false).await.unwrap();
    assert_eq!(vhost.name(), "prd");

    // create exchange: PUT then confirming GET
    fake.push_empty();
    fake.push_body(exchange_json("prd", "test_exchange", "topic"));
    let exchange = vhost
        .create_exchange("test_exchange", &ExchangeOptions::new("topic"))
        .await
        .unwrap();
    assert_eq!(exchange.name(), "test_exchange");
    assert_eq!(exchange.exchange_type(), "topic");

    // queue to bind to
    fake.push_empty();
    fake.push_body(queue_json("prd", "test_queue"));
    let queue = vhost
        .create_queue("test_queue", &QueueOptions::new().durable(true))
        .await
        .unwrap();

    // bind: POST then confirming GET of the bindings between the two
    fake.push_empty();
    fake.push_body(json!([binding_json(
        "prd",
        "test_exchange",
        "test_queue",
        "test.#"
    )]));
    exchange
        .create_binding(queue.name(), DestinationType::Queue, "test.#", &Map::new())
        .await
        .unwrap();

    // fetch the exchange's bindings
    fake.push_body(json!([
        binding_json("prd", "test_exchange", "test_queue", "test.#"),
        binding_json("prd", "test_exchange", "test_queue", "audit.#"),
    ]));
    let bindings = exchange.bindings().await.unwrap();
    let matching: Vec<_> = bindings
        .iter()
        .filter(|b| b.source() == "test_exchange" && b.routing_key() == "test.#")
        .collect();
    assert_eq!(matching.len(), 1);

    let calls = fake.calls();
    let wire: Vec<_> = calls
        .iter()
        .map(|c| (c.method, c.path.join("/")))
        .collect();
    assert_eq!(
        wire,
        vec![
            (Method::Put, "vhosts/prd".to_string()),
            (Method::Get, "vhosts/prd".to_string()),
            (Method::Put, "exchanges/prd/test_exchange".to_string()),
            (Method::Get, "exchanges/prd/test_exchange".to_string()),
            (Method::Put, "queues/prd/test_queue".to_string()),
            (Method::Get, "queues/prd/test_queue".to_string()),
            (Method::Post, "bindings/prd/e/test_exchange/q/test_queue".to_string()),
            (Method::Get, "bindings/prd/e/test_exchange/q/test_queue".to_string()),
            (Method::Get, "exchanges/prd/test_exchange/bindings/source".to_string()),
        ]
    );

    assert_eq!(calls[0].body, Some(json!({ "tracing": false })));
    assert_eq!(
        calls[2].body,
        Some(json!({
            "type": "topic",
            "auto_delete": false,
            "durable": true,
            "internal": false,
            "arguments": {}
        }))
    );
    assert_eq!(
        calls[6].body,
        Some(json!({ "routing_key": "test.#", "arguments": {} }))
    );
}

// ─────────────────────────────────────────────────────────
// Listings
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_vhost_exchange_listing_excludes_default_exchange() {
    let fake = FakeRequester::new();
    let monitor = test_monitor(&fake);

    fake.push_body(vhost_json("prd"));
    fake.push_body(load_fixture("prd_exchanges"));

    let vhost = monitor.vhost("prd").await.unwrap();
    let exchanges = vhost.exchanges().await.unwrap();

    let mut names: Vec<_> = exchanges.keys().cloned().collect();
    names.sort();
    assert_eq!(names, vec!["amq.direct", "amq.topic", "test_exchange"]);
    assert_eq!(
        exchanges["test_exchange"].metrics()["message_stats"]["publish_in"],
        json!(12)
    );
}

#[tokio::test]
async fn test_vhosts_keyed_by_name() {
    let fake = FakeRequester::new();
    fake.push_body(json!([vhost_json("/"), vhost_json("prd")]));

    let vhosts = test_monitor(&fake).vhosts().await.unwrap();

    assert_eq!(vhosts.len(), 2);
    assert_eq!(vhosts["/"].name(), "/");
    assert_eq!(vhosts["prd"].metrics()["tracing"], json!(false));
}

#[tokio::test]
async fn test_default_vhost_segment_is_passed_unjoined() {
    let fake = FakeRequester::new();
    fake.push_body(vhost_json("/"));
    fake.push_body(json!([queue_json("/", "jobs")]));

    let vhost = test_monitor(&fake).vhost("/").await.unwrap();
    let queues = vhost.queues().await.unwrap();

    assert!(queues.contains_key("jobs"));
    let calls = fake.calls();
    assert_eq!(calls[0].path, vec!["vhosts", "/"]);
    assert_eq!(calls[1].path, vec!["queues", "/"]);
}

// ─────────────────────────────────────────────────────────
// Teardown
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_teardown_then_refresh_is_not_found() {
    let fake = FakeRequester::new();
    let monitor = test_monitor(&fake);

    fake.push_body(vhost_json("prd"));
    let mut vhost = monitor.vhost("prd").await.unwrap();

    fake.push_body(queue_json("prd", "jobs"));
    let mut queue = vhost.queue("jobs").await.unwrap();

    fake.push_empty(); // purge
    fake.push_empty(); // delete queue
    fake.push_status(404); // refresh queue
    fake.push_empty(); // delete vhost
    fake.push_status(404); // refresh vhost

    queue.purge().await.unwrap();
    queue.delete(true, true).await.unwrap();
    let err = queue.refresh().await.unwrap_err();
    assert!(matches!(err, rabbitmon::Error::NotFound { .. }));

    vhost.delete().await.unwrap();
    let err = vhost.refresh().await.unwrap_err();
    assert!(err.is_transport());

    assert_eq!(fake.remaining(), 0);
}

#[tokio::test]
async fn test_delete_binding_from_listing() {
    let fake = FakeRequester::new();
    let monitor = test_monitor(&fake);
    fake.push_body(vhost_json("prd"));
    fake.push_body(json!([binding_json("prd", "test_exchange", "jobs", "test.#")]));
    fake.push_empty();

    let vhost = monitor.vhost("prd").await.unwrap();
    let bindings = vhost.bindings().await.unwrap();
    bindings[0].delete().await.unwrap();

    let last = fake.calls().pop().unwrap();
    assert_eq!(last.method, Method::Delete);
    assert_eq!(
        last.path,
        vec!["bindings", "prd", "e", "test_exchange", "q", "jobs", "test.%23"]
    );
}
