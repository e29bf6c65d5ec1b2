use super::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::error::{ErrorBody, FailureKind};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct RecordingState {
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

async fn spawn_server(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn client_for(server_url: &str) -> QueryClient {
    QueryClient::new(ClientSettings::new(server_url)).expect("client")
}

async fn answer_ok(
    State(state): State<RecordingState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.bodies.lock().await.push(body);
    Json(json!({
        "status": "success",
        "data": {
            "answer": "Pawan Sherawat made 120 raids.",
            "query": "SELECT COUNT(*) AS raids FROM raids;",
            "tokens_used": 640,
            "raw_results": [{ "raids": 120 }]
        },
        "timestamp": "2025-06-01T10:00:00"
    }))
}

#[tokio::test]
async fn send_posts_trimmed_question_once() {
    let state = RecordingState::default();
    let app = Router::new()
        .route("/ask", post(answer_ok))
        .with_state(state.clone());
    let server_url = spawn_server(app).await;
    let client = client_for(&format!("{server_url}/"));

    let question = Question::new("  total raids of Pawan  ").expect("question");
    let outcome = client.send(&question).await;

    assert!(outcome.is_success(), "unexpected outcome: {outcome:?}");
    assert_eq!(state.hits.load(Ordering::SeqCst), 1);
    assert_eq!(
        state.bodies.lock().await.as_slice(),
        &[json!({ "question": "total raids of Pawan" })]
    );
}

#[tokio::test]
async fn send_surfaces_service_detail() {
    let app = Router::new().route(
        "/ask",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    detail: Some(json!("bad question")),
                }),
            )
        }),
    );
    let server_url = spawn_server(app).await;

    let outcome = client_for(&server_url)
        .send(&Question::new("?").expect("question"))
        .await;
    assert_eq!(
        outcome,
        Outcome::Failure(Failure::service(400, "bad question"))
    );
}

#[tokio::test]
async fn send_falls_back_on_unparsable_error_body() {
    let app = Router::new().route(
        "/ask",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response() }),
    );
    let server_url = spawn_server(app).await;

    let outcome = client_for(&server_url)
        .send(&Question::new("anything").expect("question"))
        .await;
    assert_eq!(
        outcome,
        Outcome::Failure(Failure::service(500, "Failed to get response"))
    );
}

#[tokio::test]
async fn send_reports_malformed_success_body() {
    let app = Router::new().route("/ask", post(|| async { "not json at all" }));
    let server_url = spawn_server(app).await;

    let outcome = client_for(&server_url)
        .send(&Question::new("anything").expect("question"))
        .await;
    match outcome {
        Outcome::Failure(failure) => assert_eq!(failure.kind, FailureKind::MalformedPayload),
        other => panic!("expected malformed payload failure, got {other:?}"),
    }
}

#[tokio::test]
async fn send_reports_transport_failure() {
    // Bind then drop a listener so the port is very likely closed.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");

    let outcome = client_for(&format!("http://{addr}"))
        .send(&Question::new("anything").expect("question"))
        .await;
    match outcome {
        Outcome::Failure(failure) => {
            assert_eq!(failure.kind, FailureKind::Transport);
            assert!(!failure.message.is_empty());
        }
        other => panic!("expected transport failure, got {other:?}"),
    }
}

#[tokio::test]
async fn send_times_out_as_transport_failure() {
    let app = Router::new().route(
        "/ask",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "data": {} }))
        }),
    );
    let server_url = spawn_server(app).await;
    let client = QueryClient::new(
        ClientSettings::new(server_url).with_request_timeout(Duration::from_millis(100)),
    )
    .expect("client");

    let outcome = client
        .send(&Question::new("slow one").expect("question"))
        .await;
    match outcome {
        Outcome::Failure(failure) => assert_eq!(failure.kind, FailureKind::Transport),
        other => panic!("expected timeout failure, got {other:?}"),
    }
}

#[tokio::test]
async fn health_reads_service_status() {
    let app = Router::new().route(
        "/health",
        get(|| async { Json(json!({ "status": "healthy", "timestamp": "2025-06-01T10:00:00" })) }),
    );
    let server_url = spawn_server(app).await;

    let health = client_for(&server_url).health().await.expect("health");
    assert!(health.is_healthy());
    assert_eq!(health.timestamp.as_deref(), Some("2025-06-01T10:00:00"));
}

#[tokio::test]
async fn health_errors_on_non_success_status() {
    let app = Router::new().route("/health", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
    let server_url = spawn_server(app).await;

    let err = client_for(&server_url)
        .health()
        .await
        .expect_err("must fail");
    assert!(err.to_string().contains("503"), "unexpected error: {err}");
}

#[test]
fn base_url_is_trimmed_and_validated() {
    assert_eq!(
        validate_base_url(" https://example.com/api/ ").expect("url"),
        "https://example.com/api"
    );
    assert!(validate_base_url("").is_err());
    assert!(validate_base_url("localhost:8000").is_err());
    assert!(validate_base_url("ftp://example.com").is_err());
    assert!(validate_base_url("http://example.com/?x=1").is_err());
}

#[test]
fn client_rejects_invalid_base_url() {
    assert!(QueryClient::new(ClientSettings::new("not a url")).is_err());
    let client = QueryClient::new(ClientSettings::new("http://127.0.0.1:8000/")).expect("client");
    assert_eq!(client.server_url(), "http://127.0.0.1:8000");
}
