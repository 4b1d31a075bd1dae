// Integration tests for `MonitorClient` and `SearchClient` using wiremock.
#![allow(clippy::unwrap_used)]

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vigil_api::{Error, MonitorClient, SearchClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, MonitorClient) {
    let server = MockServer::start().await;
    let client = MonitorClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

async fn setup_search() -> (MockServer, SearchClient) {
    let server = MockServer::start().await;
    let client = SearchClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

// ── Alerts ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_alerts_preserves_backend_order() {
    let (server, client) = setup().await;

    let body = json!({
        "status": "success",
        "alerts": [
            { "timestamp": "2025-03-28T20:10:00", "content": "first", "level": "info" },
            { "timestamp": "2025-03-28T20:11:00", "content": "second", "details": "more" },
            { "timestamp": "2025-03-28T20:12:00", "content": "third", "image_url": "/video_warning/a.jpg" },
        ]
    });

    Mock::given(method("GET"))
        .and(path("/alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let alerts = client.list_alerts().await.unwrap();

    let contents: Vec<_> = alerts.iter().map(|a| a.content.as_str()).collect();
    assert_eq!(contents, ["first", "second", "third"]);
    assert_eq!(alerts[1].details.as_deref(), Some("more"));
    assert_eq!(alerts[2].image_url.as_deref(), Some("/video_warning/a.jpg"));
}

#[tokio::test]
async fn test_list_alerts_non_success_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/alerts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "error", "message": "store offline" })),
        )
        .mount(&server)
        .await;

    let err = client.list_alerts().await.unwrap_err();
    assert!(matches!(err, Error::Upstream { ref message } if message == "store offline"));
}

#[tokio::test]
async fn test_list_alerts_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/alerts"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.list_alerts().await.unwrap_err();
    assert!(matches!(err, Error::Http { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_list_alerts_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.list_alerts().await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization, got {other:?}"),
    }
}

// ── Behavior report ─────────────────────────────────────────────────

#[tokio::test]
async fn test_behavior_data() {
    let (server, client) = setup().await;

    let body = json!({
        "status": "success",
        "data": {
            "behaviors": [
                {"id": 1, "type": "专注工作", "count": 5, "timestamp": "2025-03-28 20:10:00"},
                {"id": 2, "type": "吃东西", "count": 3, "timestamp": "2025-03-28 20:12:30"},
                {"id": 7, "type": "其他", "count": 2, "timestamp": "2025-03-28 20:15:45"}
            ],
            "statistics": {
                "total_behaviors": 10,
                "unique_behaviors": 3,
                "most_frequent": "专注工作"
            }
        }
    });

    Mock::given(method("GET"))
        .and(path("/api/behavior-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let data = client.behavior_data().await.unwrap();
    assert_eq!(data.statistics.total_behaviors, 10);
    assert_eq!(data.statistics.unique_behaviors, 3);
    assert_eq!(data.statistics.most_frequent.as_deref(), Some("专注工作"));
    assert_eq!(data.behaviors.len(), 3);
    assert_eq!(data.behaviors[2].id, 7);
}

#[tokio::test]
async fn test_behavior_data_missing_payload() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/behavior-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .mount(&server)
        .await;

    assert!(matches!(
        client.behavior_data().await,
        Err(Error::Upstream { .. })
    ));
}

// ── Search ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ask_success() {
    let (server, client) = setup_search().await;

    Mock::given(method("POST"))
        .and(path("/search/"))
        .and(body_json(json!({ "query": "今天谁在睡觉?", "k": 3 })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "success", "answer": "下午三点有人在睡觉" })),
        )
        .mount(&server)
        .await;

    let answer = client.ask("今天谁在睡觉?", 3).await.unwrap();
    assert_eq!(answer, "下午三点有人在睡觉");
}

#[tokio::test]
async fn test_ask_failure_message_from_body() {
    let (server, client) = setup_search().await;

    Mock::given(method("POST"))
        .and(path("/search/"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "status": "error", "message": "向量库为空" })),
        )
        .mount(&server)
        .await;

    let err = client.ask("anything", 3).await.unwrap_err();
    assert!(matches!(err, Error::Upstream { ref message } if message == "向量库为空"));
}

#[tokio::test]
async fn test_ask_failure_without_message() {
    let (server, client) = setup_search().await;

    Mock::given(method("POST"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "error" })))
        .mount(&server)
        .await;

    let err = client.ask("anything", 3).await.unwrap_err();
    assert_eq!(err.to_string(), "查询失败");
}

#[tokio::test]
async fn test_ask_unparseable_error_body() {
    let (server, client) = setup_search().await;

    Mock::given(method("POST"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client.ask("anything", 3).await.unwrap_err();
    assert!(matches!(err, Error::Http { status: 502, .. }));
}
