//! Tests for enhancer server module
//! Starts the real server on an OS-assigned port with a stub completion service

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use prompt_enhancer::enhancer::server::{
    cors_response, json_error_response, json_response, serve_enhancer_ui,
};
use prompt_enhancer::enhancer::{Credential, EnhancerServer, EnhancerSettings, PromptEnhancer};
use prompt_enhancer::error::{EnhancementError, TRANSPORT_GUIDANCE};
use prompt_enhancer::service::{CompletionRequest, CompletionService};
use serde_json::{json, Value};
use tokio::sync::Notify;

/// Completion stub; optionally parks until released
struct StubService {
    reply: Result<String, EnhancementError>,
    calls: AtomicUsize,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl StubService {
    fn replying(reply: Result<String, EnhancementError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    fn gated(reply: &str, entered: Arc<Notify>, release: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            gate: Some((entered, release)),
        })
    }
}

#[async_trait]
impl CompletionService for StubService {
    async fn complete(
        &self,
        _credential: &Credential,
        _request: &CompletionRequest,
    ) -> Result<String, EnhancementError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        self.reply.clone()
    }
}

async fn start_server(service: Arc<StubService>) -> (EnhancerServer, String) {
    start_server_with_ttl(service, Duration::from_secs(60)).await
}

async fn start_server_with_ttl(
    service: Arc<StubService>,
    session_ttl: Duration,
) -> (EnhancerServer, String) {
    let enhancer = PromptEnhancer::new(service, EnhancerSettings::default());
    let server = EnhancerServer::new(enhancer, 0, session_ttl);
    server.start().await.unwrap();
    let base = format!("http://127.0.0.1:{}", server.get_port().await);
    (server, base)
}

async fn new_session(client: &reqwest::Client, base: &str) -> String {
    let body: Value = client
        .post(format!("{}/api/session", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["sessionId"].as_str().unwrap().to_string()
}

fn filled_form(session_id: &str) -> Value {
    json!({
        "sessionId": session_id,
        "apiKey": "sk-test",
        "role": "a historian",
        "context": "high school students",
        "task": "summarize the industrial revolution",
        "includeExamples": true,
        "includeSteps": false,
        "responseLength": "Detailed"
    })
}

// ========================================================================
// Page Tests
// ========================================================================

#[tokio::test]
async fn test_serves_page_at_root_and_enhance() {
    let (_server, base) = start_server(StubService::replying(Ok(String::new()))).await;
    let client = reqwest::Client::new();

    for path in ["/", "/enhance"] {
        let resp = client.get(format!("{}{}", base, path)).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));
        let html = resp.text().await.unwrap();
        assert!(html.contains("Enhance Prompt"));
    }
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (_server, base) = start_server(StubService::replying(Ok(String::new()))).await;
    let resp = reqwest::get(format!("{}/nope", base)).await.unwrap();
    assert_eq!(resp.status(), 404);
}

// ========================================================================
// Session API Tests
// ========================================================================

#[tokio::test]
async fn test_create_session_returns_empty_view() {
    let (server, base) = start_server(StubService::replying(Ok(String::new()))).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/api/session", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(body["sessionId"].as_str().is_some());
    assert_eq!(body["view"]["role"], "");
    assert_eq!(body["view"]["includeExamples"], true);
    assert_eq!(body["view"]["includeSteps"], true);
    assert_eq!(body["view"]["responseLength"], "Concise");
    assert_eq!(body["view"]["credentialProvided"], false);
    assert_eq!(body["view"]["busy"], false);
    assert!(body["view"]["result"].is_null());
    assert_eq!(server.session_count().await, 1);
}

#[tokio::test]
async fn test_get_session_requires_id_and_known_session() {
    let (_server, base) = start_server(StubService::replying(Ok(String::new()))).await;
    let client = reqwest::Client::new();

    let missing = client.get(format!("{}/api/session", base)).send().await.unwrap();
    assert_eq!(missing.status(), 400);

    let unknown = client
        .get(format!("{}/api/session?session=does-not-exist", base))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), 404);
}

// ========================================================================
// Submit Tests
// ========================================================================

#[tokio::test]
async fn test_submit_success_returns_result_without_credential() {
    let service = StubService::replying(Ok("Enhanced text".to_string()));
    let (_server, base) = start_server(service.clone()).await;
    let client = reqwest::Client::new();
    let session_id = new_session(&client, &base).await;

    let resp = client
        .post(format!("{}/api/submit", base))
        .json(&filled_form(&session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let text = resp.text().await.unwrap();
    assert!(!text.contains("sk-test"));

    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["view"]["result"], "Enhanced text");
    assert_eq!(body["view"]["credentialProvided"], true);
    assert_eq!(body["view"]["responseLength"], "Detailed");
    assert_eq!(body["view"]["includeSteps"], false);
    assert!(body["view"]["error"].is_null());
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);

    // The stored view matches
    let stored: Value = client
        .get(format!("{}/api/session?session={}", base, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["view"]["result"], "Enhanced text");
}

#[tokio::test]
async fn test_submit_with_empty_field_is_rejected_without_call() {
    let service = StubService::replying(Ok("unused".to_string()));
    let (_server, base) = start_server(service.clone()).await;
    let client = reqwest::Client::new();
    let session_id = new_session(&client, &base).await;

    let mut form = filled_form(&session_id);
    form["context"] = json!("   ");

    let resp = client
        .post(format!("{}/api/submit", base))
        .json(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Context"));
    assert_eq!(body["view"]["error"]["kind"], "validation");
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_submit_without_credential_is_rejected() {
    let service = StubService::replying(Ok("unused".to_string()));
    let (_server, base) = start_server(service.clone()).await;
    let client = reqwest::Client::new();
    let session_id = new_session(&client, &base).await;

    let mut form = filled_form(&session_id);
    form["apiKey"] = json!("");

    let resp = client
        .post(format!("{}/api/submit", base))
        .json(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Please provide your API Key");
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_submit_transport_failure_returns_guidance() {
    let service = StubService::replying(Err(EnhancementError::RateLimited(
        "rate limit exceeded".to_string(),
    )));
    let (_server, base) = start_server(service).await;
    let client = reqwest::Client::new();
    let session_id = new_session(&client, &base).await;

    let resp = client
        .post(format!("{}/api/submit", base))
        .json(&filled_form(&session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("rate limit exceeded"));
    assert_eq!(body["guidance"], TRANSPORT_GUIDANCE);
    assert_eq!(body["view"]["error"]["kind"], "transport");
    assert_eq!(body["view"]["busy"], false);
}

#[tokio::test]
async fn test_submit_unknown_session_is_not_found() {
    let (_server, base) = start_server(StubService::replying(Ok(String::new()))).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/submit", base))
        .json(&filled_form("missing-session"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_submit_invalid_body_is_bad_request() {
    let (_server, base) = start_server(StubService::replying(Ok(String::new()))).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/submit", base))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_second_submit_while_pending_is_conflict() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let service = StubService::gated("slow result", entered.clone(), release.clone());
    let (_server, base) = start_server(service.clone()).await;
    let client = reqwest::Client::new();
    let session_id = new_session(&client, &base).await;

    let first = {
        let client = client.clone();
        let url = format!("{}/api/submit", base);
        let form = filled_form(&session_id);
        tokio::spawn(async move { client.post(url).json(&form).send().await.unwrap() })
    };

    entered.notified().await;

    let second = client
        .post(format!("{}/api/submit", base))
        .json(&filled_form(&session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 409);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["view"]["busy"], true);

    release.notify_one();
    let first = first.await.unwrap();
    assert_eq!(first.status(), 200);
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["view"]["result"], "slow result");
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
}

// ========================================================================
// End Session Tests
// ========================================================================

#[tokio::test]
async fn test_end_session_discards_state() {
    let (server, base) = start_server(StubService::replying(Ok(String::new()))).await;
    let client = reqwest::Client::new();
    let session_id = new_session(&client, &base).await;

    let resp = client
        .post(format!("{}/api/end", base))
        .json(&json!({ "sessionId": session_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(server.session_count().await, 0);

    let again = client
        .post(format!("{}/api/end", base))
        .json(&json!({ "sessionId": session_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 404);
}

#[tokio::test]
async fn test_sessions_expire_after_ttl() {
    let enhancer = PromptEnhancer::new(
        StubService::replying(Ok(String::new())),
        EnhancerSettings::default(),
    );
    let server = EnhancerServer::new(enhancer, 0, Duration::from_millis(20));

    server.create_session().await;
    assert_eq!(server.session_count().await, 1);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.sweep_expired().await, 1);
    assert_eq!(server.session_count().await, 0);
}

#[tokio::test]
async fn test_expired_session_is_not_served() {
    let service = StubService::replying(Ok("too late".to_string()));
    let (server, base) = start_server_with_ttl(service.clone(), Duration::from_millis(50)).await;
    let client = reqwest::Client::new();
    let session_id = new_session(&client, &base).await;

    tokio::time::sleep(Duration::from_millis(250)).await;

    let view = client
        .get(format!("{}/api/session?session={}", base, session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(view.status(), 404);

    let submit = client
        .post(format!("{}/api/submit", base))
        .json(&filled_form(&session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(submit.status(), 404);
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    assert_eq!(server.session_count().await, 0);
}

#[tokio::test]
async fn test_active_session_outlives_ttl_while_used() {
    let (_server, base) =
        start_server_with_ttl(StubService::replying(Ok(String::new())), Duration::from_millis(400))
            .await;
    let client = reqwest::Client::new();
    let session_id = new_session(&client, &base).await;

    for _ in 0..4 {
        tokio::time::sleep(Duration::from_millis(150)).await;
        let resp = client
            .get(format!("{}/api/session?session={}", base, session_id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
}

#[tokio::test]
async fn test_end_session_direct() {
    let enhancer = PromptEnhancer::new(
        StubService::replying(Ok(String::new())),
        EnhancerSettings::default(),
    );
    let server = EnhancerServer::new(enhancer, 0, Duration::from_secs(60));

    let id = server.create_session().await;
    assert!(server.end_session(&id).await);
    assert!(!server.end_session(&id).await);
}

// ========================================================================
// Response Helper Tests
// ========================================================================

#[test]
fn test_cors_response_headers() {
    let response = Response::builder()
        .status(StatusCode::OK)
        .body(Full::new(Bytes::new()))
        .unwrap();

    let cors_resp = cors_response(response);
    let headers = cors_resp.headers();
    assert_eq!(headers["Access-Control-Allow-Origin"], "http://localhost");
    assert_eq!(headers["Access-Control-Allow-Methods"], "GET, POST, OPTIONS");
    assert_eq!(headers["Access-Control-Allow-Headers"], "Content-Type");
}

#[test]
fn test_serve_enhancer_ui_content_type() {
    let response = serve_enhancer_ui();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["Content-Type"],
        "text/html; charset=utf-8"
    );
}

#[tokio::test]
async fn test_json_error_response_body() {
    let response = json_error_response(StatusCode::NOT_FOUND, "Session not \"found\"");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Session not \"found\"");
}

#[test]
fn test_json_response_status() {
    let response = json_response(StatusCode::CREATED, "{}");
    assert_eq!(response.status(), StatusCode::CREATED);
}
