//! End-to-end tests for directory lookup and notification delivery.
//!
//! Delivery endpoints (and, where noted, the directory store itself) are
//! played by wiremock servers.

use miniapp_notify::directory::{MemoryDirectoryStore, RestDirectoryStore};
use miniapp_notify::dispatch::DeliveryRequest;
use miniapp_notify::{
    DeliveryOutcome, Directory, DirectoryRecord, DirectoryStore, Dispatcher, Notification,
    RecipientIdentity,
};
use reqwest::Client;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn memory_dispatcher() -> Dispatcher {
    let store: Arc<dyn DirectoryStore> = Arc::new(MemoryDirectoryStore::new());
    Dispatcher::new(Arc::new(Directory::new(store, "miniapp")), Client::new())
}

async fn register(dispatcher: &Dispatcher, id: u64, token: &str, url: &str) {
    dispatcher
        .directory()
        .set(&RecipientIdentity::id(id), &DirectoryRecord::new(token, url))
        .await
        .unwrap();
}

fn broadcast(id: u64) -> Notification {
    Notification::new(
        RecipientIdentity::id(id),
        "Mining boost",
        "Your upgrade is live",
        "https://app.example.com/boost",
    )
}

fn echo_success() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "successfulTokens": ["ok"],
        "invalidTokens": [],
        "rateLimitedTokens": []
    }))
}

#[tokio::test]
async fn test_two_endpoints_get_two_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/one"))
        .respond_with(echo_success())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/two"))
        .respond_with(echo_success())
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = memory_dispatcher();
    let one = format!("{}/one", server.uri());
    let two = format!("{}/two", server.uri());
    register(&dispatcher, 1, "t1", &one).await;
    register(&dispatcher, 2, "t2", &two).await;
    register(&dispatcher, 3, "t3", &one).await;
    register(&dispatcher, 4, "t4", &two).await;
    register(&dispatcher, 5, "t5", &one).await;

    let items: Vec<Notification> = (1..=5).map(broadcast).collect();
    let report = dispatcher.dispatch_batch(&items).await.unwrap();

    assert_eq!(report.delivered_groups, 2);
    assert!(report.failed_groups.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        let body: DeliveryRequest = serde_json::from_slice(&request.body).unwrap();
        match request.url.path() {
            "/one" => assert_eq!(body.tokens, vec!["t1", "t3", "t5"]),
            "/two" => assert_eq!(body.tokens, vec!["t2", "t4"]),
            other => panic!("unexpected path {other}"),
        }
    }
}

#[tokio::test]
async fn test_default_grouping_sends_personalised_items_in_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(echo_success())
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = memory_dispatcher();
    let hook = format!("{}/hook", server.uri());
    register(&dispatcher, 1, "alice", &hook).await;
    register(&dispatcher, 2, "bob", &hook).await;

    let items = [
        Notification::new(RecipientIdentity::id(1), "Hi Alice", "Claim now", "https://app"),
        Notification::new(RecipientIdentity::id(2), "Hi Bob", "Claim now", "https://app"),
    ];
    let report = dispatcher.dispatch_batch(&items).await.unwrap();
    assert_eq!(report.delivered_groups, 1);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: DeliveryRequest = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body.title, "Hi Alice");
    assert_eq!(body.tokens, vec!["alice", "bob"]);
}

#[tokio::test]
async fn test_failed_group_does_not_sink_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "successfulTokens": ["g1", "g2"],
            "invalidTokens": [],
            "rateLimitedTokens": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bad"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(2)
        .mount(&server)
        .await;

    let dispatcher = memory_dispatcher();
    register(&dispatcher, 1, "g1", &format!("{}/good", server.uri())).await;
    register(&dispatcher, 2, "b1", &format!("{}/bad", server.uri())).await;
    register(&dispatcher, 3, "g2", &format!("{}/good", server.uri())).await;

    let items: Vec<Notification> = (1..=3).map(broadcast).collect();

    let report = dispatcher.dispatch_batch(&items).await.unwrap();
    assert_eq!(report.delivered_groups, 1);
    assert_eq!(report.failed_groups.len(), 1);
    assert!(report.failed_groups[0].endpoint.ends_with("/bad"));

    let outcome = dispatcher.send_batch(&items).await.unwrap().unwrap();
    assert_eq!(outcome.successful_tokens, vec!["g1", "g2"]);
}

#[tokio::test]
async fn test_same_token_in_two_groups_counted_twice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "successfulTokens": [],
            "invalidTokens": ["dup"],
            "rateLimitedTokens": []
        })))
        .expect(2)
        .mount(&server)
        .await;

    let dispatcher = memory_dispatcher();
    register(&dispatcher, 1, "dup", &format!("{}/a", server.uri())).await;
    register(&dispatcher, 2, "dup", &format!("{}/b", server.uri())).await;

    let outcome = dispatcher
        .send_batch(&[broadcast(1), broadcast(2)])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.invalid_tokens, vec!["dup", "dup"]);
}

#[tokio::test]
async fn test_every_group_failing_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dispatcher = memory_dispatcher();
    register(&dispatcher, 1, "t", &server.uri()).await;

    assert_eq!(dispatcher.send_batch(&[broadcast(1)]).await.unwrap(), None);
}

#[tokio::test]
async fn test_token_identity_without_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "successfulTokens": [],
            "invalidTokens": [],
            "rateLimitedTokens": ["tok"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = memory_dispatcher();
    let identity = RecipientIdentity::token("tok", server.uri());
    dispatcher
        .directory()
        .set(&identity, &DirectoryRecord::new("tok", server.uri()))
        .await
        .unwrap();

    let outcome = dispatcher
        .send_one(identity, "t", "b", "https://app", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        outcome,
        DeliveryOutcome {
            successful_tokens: vec![],
            invalid_tokens: vec![],
            rate_limited_tokens: vec!["tok".to_string()],
        }
    );
}

#[tokio::test]
async fn test_rest_store_backed_send() {
    let endpoint = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "successfulTokens": ["abc"],
            "invalidTokens": [],
            "rateLimitedTokens": []
        })))
        .expect(1)
        .mount(&endpoint)
        .await;

    let record = serde_json::json!({"token": "abc", "url": format!("{}/webhook", endpoint.uri())});
    let store_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(serde_json::json!(["GET", "miniapp:user:1001"])))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": record.to_string()})),
        )
        .expect(1)
        .mount(&store_server)
        .await;

    let client = Client::new();
    let store: Arc<dyn DirectoryStore> = Arc::new(RestDirectoryStore::new(
        client.clone(),
        store_server.uri(),
        "token".to_string(),
    ));
    let dispatcher = Dispatcher::new(Arc::new(Directory::new(store, "miniapp")), client);

    let outcome = dispatcher
        .send_one(RecipientIdentity::id(1001), "Share", "Invite a friend", "https://app", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.successful_tokens, vec!["abc"]);
}

#[tokio::test]
async fn test_store_outage_means_no_notification() {
    let store_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&store_server)
        .await;

    let client = Client::new();
    let store: Arc<dyn DirectoryStore> = Arc::new(RestDirectoryStore::new(
        client.clone(),
        store_server.uri(),
        "token".to_string(),
    ));
    let dispatcher = Dispatcher::new(Arc::new(Directory::new(store, "miniapp")), client);

    let outcome = dispatcher
        .send_one(RecipientIdentity::id(1001), "t", "b", "https://app", None)
        .await
        .unwrap();
    assert_eq!(outcome, None);
    assert_eq!(dispatcher.send_batch(&[broadcast(1)]).await.unwrap(), None);

    // Writes degrade too
    dispatcher
        .directory()
        .set(&RecipientIdentity::id(1), &DirectoryRecord::new("t", "https://x"))
        .await
        .unwrap();
}
