// Integration tests for `Monitor` against a mocked backend.
//
// wiremock cannot upgrade to WebSocket, so both live channels keep
// failing here; that exercises the HTTP side and the snapshot plumbing.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vigil_api::ReconnectConfig;
use vigil_core::{
    AlertOrigin, ConnectionState, CoreError, Monitor, MonitorConfig, Severity,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> MonitorConfig {
    let base = Url::parse(&server.uri()).unwrap();
    let mut config = MonitorConfig::new(base.clone(), base);
    config.video_reconnect = ReconnectConfig {
        delay: Duration::from_secs(60),
    };
    config.alert_reconnect = ReconnectConfig {
        delay: Duration::from_secs(60),
    };
    config
}

async fn mount_alerts(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "alerts": [
                {"timestamp": "2025-03-28T20:10:00", "content": "检测到人员进行了抽烟",
                 "image_url": "/video_warning/a.jpg"},
                {"timestamp": "2025-03-28T20:11:00", "content": "门口有人", "level": "warning"}
            ]
        })))
        .mount(server)
        .await;
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn start_loads_historical_alerts_into_snapshot() {
    let server = MockServer::start().await;
    mount_alerts(&server).await;

    let monitor = Monitor::new(config(&server)).unwrap();
    let mut stream = monitor.subscribe();
    monitor.start().await.unwrap();

    let snap = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snap = stream.changed().await.expect("monitor dropped");
            if snap.alert_total > 0 {
                return snap;
            }
        }
    })
    .await
    .expect("historical alerts never arrived");

    assert_eq!(snap.alert_total, 2);
    let historical: Vec<_> = snap
        .alerts
        .iter()
        .filter(|a| a.origin == AlertOrigin::Historical)
        .collect();
    assert_eq!(historical.len(), 2);
    assert_eq!(historical[0].severity(), Severity::Important);
    assert_eq!(historical[1].severity(), Severity::Warning);
    assert!(snap.clip.is_some());
    assert_ne!(snap.video, ConnectionState::Open);

    monitor.shutdown().await;
    assert!(!monitor.is_running());
}

#[tokio::test]
async fn historical_failure_surfaces_in_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alerts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "error", "message": "数据库不可用"})),
        )
        .mount(&server)
        .await;

    let monitor = Monitor::new(config(&server)).unwrap();
    let mut stream = monitor.subscribe();
    monitor.start().await.unwrap();

    let error = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snap = stream.changed().await.expect("monitor dropped");
            if let Some(error) = snap.alerts_error.clone() {
                return error;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(error, "数据库不可用");

    monitor.shutdown().await;
}

#[tokio::test]
async fn start_twice_is_rejected_and_reset_needs_running() {
    let server = MockServer::start().await;
    mount_alerts(&server).await;

    let monitor = Monitor::new(config(&server)).unwrap();
    assert!(matches!(monitor.reset(), Err(CoreError::NotRunning)));

    monitor.start().await.unwrap();
    assert!(matches!(monitor.start().await, Err(CoreError::AlreadyStarted)));
    monitor.reset().unwrap();

    monitor.shutdown().await;
    assert!(matches!(monitor.reset(), Err(CoreError::NotRunning)));
}

#[tokio::test]
async fn behavior_report_without_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/behavior-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {
                "statistics": {"total_behaviors": 8, "unique_behaviors": 2, "most_frequent": "喝水"},
                "behaviors": [
                    {"id": 3, "type": "喝水", "count": 6, "timestamp": "2025-03-28 20:10:00"},
                    {"id": 6, "type": "睡觉", "count": 2, "timestamp": "2025-03-28 20:30:00"}
                ]
            }
        })))
        .mount(&server)
        .await;

    let monitor = Monitor::new(config(&server)).unwrap();
    let report = monitor.behavior_report().await.unwrap();
    assert_eq!(report.statistics.total_behaviors, 8);
    assert_eq!(report.statistics.most_frequent.as_deref(), Some("喝水"));
    assert_eq!(report.counted(), 8);
}

#[tokio::test]
async fn ask_trims_and_rejects_blank_questions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search/"))
        .and(body_json(json!({"query": "谁在喝水", "k": 3})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "success", "answer": "没有人"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let monitor = Monitor::new(config(&server)).unwrap();
    assert!(matches!(monitor.ask("  ", 3).await, Err(CoreError::EmptyQuestion)));
    assert_eq!(monitor.ask("  谁在喝水 ", 3).await.unwrap(), "没有人");
}

#[tokio::test]
async fn ask_failure_keeps_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"status": "error"})))
        .mount(&server)
        .await;

    let monitor = Monitor::new(config(&server)).unwrap();
    let err = monitor.ask("问题", 3).await.unwrap_err();
    assert_eq!(err.to_string(), "查询失败");
}
