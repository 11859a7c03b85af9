//! Fetching and publishing messages across management versions

use serde_json::json;

use rabbitmon::{Error, GetMessages, PayloadEncoding, Publish};
use rabbitmon_api::test_utils::FakeRequester;
use rabbitmon_api::Method;

use crate::{exchange_json, load_fixture, queue_json, test_monitor, test_monitor_at, vhost_json};

#[tokio::test]
async fn test_version_detected_once_then_ackmode_body() {
    let fake = FakeRequester::new();
    let monitor = test_monitor(&fake);

    fake.push_body(vhost_json("prd"));
    fake.push_body(queue_json("prd", "jobs"));
    let vhost = monitor.vhost("prd").await.unwrap();
    let queue = vhost.queue("jobs").await.unwrap();

    fake.push_body(load_fixture("overview"));
    fake.push_body(load_fixture("get_messages"));
    fake.push_body(json!([]));

    let messages = queue
        .get_messages(&GetMessages::new(2).requeue(true))
        .await
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].routing_key(), "test.created");
    assert_eq!(messages[0].properties()["delivery_mode"], json!(2));
    assert!(messages[1].properties().is_empty());

    // second fetch reuses the cached version
    let again = queue
        .get_messages(&GetMessages::new(1).requeue(false).reject(true))
        .await
        .unwrap();
    assert!(again.is_empty());

    let calls = fake.calls();
    let overview_calls = calls
        .iter()
        .filter(|c| c.path == vec!["overview"])
        .count();
    assert_eq!(overview_calls, 1);

    let posts: Vec<_> = calls.iter().filter(|c| c.method == Method::Post).collect();
    assert_eq!(posts.len(), 2);
    assert_eq!(
        posts[0].body,
        Some(json!({
            "count": 2,
            "encoding": "auto",
            "name": "jobs",
            "vhost": "prd",
            "ackmode": "ack_requeue_true"
        }))
    );
    assert_eq!(posts[1].body.as_ref().unwrap()["ackmode"], json!("reject_requeue_false"));
}

#[tokio::test]
async fn test_requeue_flag_dialect_on_36() {
    let fake = FakeRequester::new();
    let monitor = test_monitor_at(&fake, "3.6.15");

    fake.push_body(json!([queue_json("/", "jobs")]));
    fake.push_body(json!([]));

    let queues = monitor.queues().await.unwrap();
    let request = GetMessages::new(5)
        .requeue(false)
        .encoding(PayloadEncoding::Base64)
        .truncate(1024);
    queues[0].get_messages(&request).await.unwrap();

    let post = fake.calls().pop().unwrap();
    assert_eq!(post.path, vec!["queues", "/", "jobs", "get"]);
    assert_eq!(
        post.body,
        Some(json!({
            "count": 5,
            "encoding": "base64",
            "name": "jobs",
            "vhost": "/",
            "requeue": false,
            "truncate": 1024
        }))
    );
}

#[tokio::test]
async fn test_reject_on_36_fails_before_any_call() {
    let fake = FakeRequester::new();
    let monitor = test_monitor_at(&fake, "3.6.5");

    fake.push_body(json!([queue_json("/", "jobs")]));
    let queues = monitor.queues().await.unwrap();
    let before = fake.call_count();

    let err = queues[0]
        .get_messages(&GetMessages::new(1).requeue(false).reject(true))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedOperation { .. }));
    assert!(err.is_unsupported());
    assert_eq!(fake.call_count(), before);
}

#[tokio::test]
async fn test_pre_36_has_no_dialect() {
    let fake = FakeRequester::new();
    let monitor = test_monitor(&fake);

    fake.push_body(json!({ "management_version": "3.5.7" }));
    let version = monitor.management_version().await.unwrap();
    assert_eq!(version.to_string(), "3.5.7");

    let fake = FakeRequester::new();
    let monitor = test_monitor_at(&fake, "3.5.7");
    fake.push_body(json!([queue_json("/", "jobs")]));
    let queues = monitor.queues().await.unwrap();

    let err = queues[0]
        .get_messages(&GetMessages::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedVersion { .. }));
    assert_eq!(fake.call_count(), 1);
}

#[tokio::test]
async fn test_publish_through_exchange() {
    let fake = FakeRequester::new();
    let monitor = test_monitor(&fake);

    fake.push_body(vhost_json("prd"));
    fake.push_body(exchange_json("prd", "test_exchange", "topic"));
    fake.push_body(json!({ "routed": false }));

    let vhost = monitor.vhost("prd").await.unwrap();
    let exchange = vhost.exchange("test_exchange").await.unwrap();
    let routed = exchange
        .publish(&Publish::text("test.nowhere", "{}").property("delivery_mode", json!(2)))
        .await
        .unwrap();

    assert!(!routed);
    let post = fake.calls().pop().unwrap();
    assert_eq!(post.path, vec!["exchanges", "prd", "test_exchange", "publish"]);
    assert_eq!(post.body.unwrap()["properties"], json!({ "delivery_mode": 2 }));
}
