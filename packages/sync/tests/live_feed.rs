//! Integration tests for live feeds against an in-process mock backend.
//!
//! The backend serves REST snapshots and WebSocket streams the way the real
//! one does, so these tests exercise reqwest, tokio-tungstenite and the
//! subscription loop together.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::get,
};
use geolive_shared::session::Session;
use geolive_sync::{AlertsFeed, ConnectionPhase, FeedItem, FeedState, IotFeed};
use serde_json::json;
use tokio::sync::{Notify, watch};

const TOKEN: &str = "secret";
const WAIT: Duration = Duration::from_secs(5);

/// Shared state of the mock backend
#[derive(Clone, Default)]
struct Backend {
    /// Signals the alerts stream to push one created alert
    push_alert: Arc<Notify>,
    /// Query strings seen by stream routes
    stream_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    /// Query strings seen by snapshot routes
    snapshot_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

async fn alerts_snapshot(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }
    Json(json!([
        { "id": "b", "type": "warning", "title": "Depth exceeded" },
        { "id": "a", "type": "info" }
    ]))
    .into_response()
}

async fn alerts_stream(
    ws: WebSocketUpgrade,
    State(backend): State<Backend>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    backend.stream_queries.lock().unwrap().push(query);
    ws.on_upgrade(move |socket| push_alert_when_asked(socket, backend))
}

async fn push_alert_when_asked(mut socket: WebSocket, backend: Backend) {
    backend.push_alert.notified().await;
    let frame = json!({
        "type": "alert.created",
        "payload": { "id": "c", "type": "critical", "location": "Block 7" }
    });
    if socket
        .send(Message::Text(frame.to_string().into()))
        .await
        .is_err()
    {
        return;
    }
    while let Some(Ok(message)) = socket.recv().await {
        if matches!(message, Message::Close(_)) {
            break;
        }
    }
}

async fn iot_snapshot(
    State(backend): State<Backend>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let sensor = query.get("sensor").cloned().unwrap_or_default();
    backend.snapshot_queries.lock().unwrap().push(query);
    Json(json!([{ "id": "r0", "sensor": sensor, "value": 10.5, "unit": "ug/m3" }]))
}

async fn iot_stream(
    ws: WebSocketUpgrade,
    State(backend): State<Backend>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let sensor = query.get("sensor").cloned().unwrap_or_default();
    backend.stream_queries.lock().unwrap().push(query);
    ws.on_upgrade(move |mut socket| async move {
        let frame = json!({
            "type": "iot",
            "data": { "id": "r1", "sensor": sensor, "value": 12.0 }
        });
        if socket
            .send(Message::Text(frame.to_string().into()))
            .await
            .is_ok()
        {
            while let Some(Ok(message)) = socket.recv().await {
                if matches!(message, Message::Close(_)) {
                    break;
                }
            }
        }
    })
}

/// Start the mock backend on an ephemeral port and return its base URL.
async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/alerts/", get(alerts_snapshot))
        .route("/alerts/ws", get(alerts_stream))
        .route("/iot/", get(iot_snapshot))
        .route("/iot/ws", get(iot_stream))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn wait_until<T: FeedItem>(
    rx: &mut watch::Receiver<FeedState<T>>,
    predicate: impl FnMut(&FeedState<T>) -> bool,
) -> FeedState<T> {
    tokio::time::timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for state")
        .expect("state channel closed")
        .clone()
}

#[tokio::test]
async fn test_alerts_snapshot_and_live_push() {
    // テスト項目: 認証付きでスナップショットを取得し、ライブ通知が先頭に追加される
    // given (前提条件):
    let backend = Backend::default();
    let base = spawn_backend(backend.clone()).await;
    let session = Session::new(&base, Some(TOKEN.to_string())).unwrap();
    let sub = geolive_sync::subscribe(&session, AlertsFeed, None);
    let mut rx = sub.state();
    wait_until(&mut rx, |s| s.is_connected() && s.items().len() == 2).await;

    // when (操作):
    backend.push_alert.notify_one();
    let state = wait_until(&mut rx, |s| s.items().len() == 3).await;

    // then (期待する結果):
    let ids: Vec<_> = state.items().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "b", "a"]);
    assert_eq!(state.items()[0].kind, "critical");
    assert_eq!(state.items()[0].location.as_deref(), Some("Block 7"));
    assert_eq!(state.last_error(), None);
    let queries = backend.stream_queries.lock().unwrap().clone();
    assert_eq!(queries[0].get("token").map(String::as_str), Some(TOKEN));

    sub.shutdown().await;
}

#[tokio::test]
async fn test_rejected_snapshot_records_error_but_stream_connects() {
    // テスト項目: スナップショットが 401 の場合はエラーを記録し、ストリームは接続される
    // given (前提条件):
    let backend = Backend::default();
    let base = spawn_backend(backend.clone()).await;
    let session = Session::new(&base, None).unwrap();

    // when (操作):
    let sub = geolive_sync::subscribe(&session, AlertsFeed, None);
    let mut rx = sub.state();
    let state = wait_until(&mut rx, |s| s.is_connected() && s.last_error().is_some()).await;

    // then (期待する結果):
    assert!(state.last_error().unwrap_or_default().contains("401"));
    assert!(state.items().is_empty());
    assert!(backend.stream_queries.lock().unwrap()[0].get("token").is_none());

    sub.shutdown().await;
}

#[tokio::test]
async fn test_iot_sensor_scopes_snapshot_and_stream() {
    // テスト項目: センサー指定がスナップショットとストリームの両方に付与される
    // given (前提条件):
    let backend = Backend::default();
    let base = spawn_backend(backend.clone()).await;
    let session = Session::new(&base, Some(TOKEN.to_string())).unwrap();

    // when (操作):
    let sub = geolive_sync::subscribe(&session, IotFeed::new(Some("pm25".to_string())), None);
    let mut rx = sub.state();
    let state = wait_until(&mut rx, |s| s.is_connected() && s.last_updated().is_some()).await;

    // then (期待する結果):
    assert!(!state.items().is_empty());
    assert!(
        state
            .items()
            .iter()
            .all(|r| r.sensor.as_deref() == Some("pm25"))
    );
    let snapshot = backend.snapshot_queries.lock().unwrap().clone();
    let stream = backend.stream_queries.lock().unwrap().clone();
    assert_eq!(snapshot[0].get("sensor").map(String::as_str), Some("pm25"));
    assert_eq!(stream[0].get("sensor").map(String::as_str), Some("pm25"));

    sub.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_backend_disconnects() {
    // テスト項目: バックエンドに接続できない場合は Disconnected になり、取得エラーが記録される
    // given (前提条件):
    let session = Session::new("http://127.0.0.1:1", None).unwrap();

    // when (操作):
    let sub = geolive_sync::subscribe(&session, AlertsFeed, None);
    let mut rx = sub.state();
    let state = wait_until(&mut rx, |s| {
        s.phase() == ConnectionPhase::Disconnected && s.last_error().is_some()
    })
    .await;

    // then (期待する結果):
    assert!(!state.is_connected());
    sub.shutdown().await;
}
