//! Enhancer Server - HTTP server and Session management
//! Serves the form page and its JSON API

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::SubmitError;

use super::components::{Credential, EnhancementOptions, PromptComponents, ResponseLength};
use super::prompt_enhancer::PromptEnhancer;
use super::session::FormSession;
use super::templates::ENHANCER_UI_HTML;

/// Maximum request body size (1MB)
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Number of consecutive ports tried when the configured one is taken
const PORT_ATTEMPTS: u16 = 100;

/// Upper bound on the background sweep period
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Session entry held by the server
pub struct SessionEntry {
    pub form: FormSession,
    pub last_active: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            form: FormSession::new(),
            last_active: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// Idle past the TTL; a session with a request in flight never expires
    pub fn is_expired(&self, ttl: Duration) -> bool {
        !self.form.is_busy() && self.last_active.elapsed() >= ttl
    }
}

type SessionMap = Arc<RwLock<HashMap<String, SessionEntry>>>;

/// State shared by every connection
#[derive(Clone)]
struct ServerState {
    sessions: SessionMap,
    enhancer: PromptEnhancer,
    session_ttl: Duration,
}

/// Enhancer HTTP Server
pub struct EnhancerServer {
    port: Arc<RwLock<u16>>,
    running: Arc<RwLock<bool>>,
    state: ServerState,
}

impl EnhancerServer {
    pub fn new(enhancer: PromptEnhancer, start_port: u16, session_ttl: Duration) -> Self {
        Self {
            port: Arc::new(RwLock::new(start_port)),
            running: Arc::new(RwLock::new(false)),
            state: ServerState {
                sessions: Arc::new(RwLock::new(HashMap::new())),
                enhancer,
                session_ttl,
            },
        }
    }

    /// Start HTTP server
    pub async fn start(&self) -> Result<()> {
        {
            let mut running = self.running.write().await;
            if *running {
                return Ok(()); // Already running
            }
            *running = true;
        }

        let mut port = *self.port.read().await;
        let mut listener: Option<TcpListener> = None;

        // Try to bind to port, increment if in use
        for _ in 0..PORT_ATTEMPTS {
            match TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port))).await {
                Ok(l) => {
                    listener = Some(l);
                    break;
                }
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::AddrInUse && port < u16::MAX {
                        warn!("Port {} is in use, trying {}", port, port + 1);
                        port += 1;
                    } else {
                        let mut running = self.running.write().await;
                        *running = false;
                        return Err(anyhow!("Failed to bind to port: {}", e));
                    }
                }
            }
        }

        let listener = match listener {
            Some(l) => l,
            None => {
                let mut running = self.running.write().await;
                *running = false;
                return Err(anyhow!("Could not find available port"));
            }
        };

        // Port 0 asks the OS for a free port
        let bound_port = listener.local_addr().map(|a| a.port()).unwrap_or(port);
        {
            let mut port_lock = self.port.write().await;
            *port_lock = bound_port;
        }

        info!("Enhancer server started: http://localhost:{}", bound_port);

        let sweep_state = self.state.clone();
        let sweep_every = self
            .state
            .session_ttl
            .clamp(Duration::from_millis(1), MAX_SWEEP_INTERVAL);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_every);
            loop {
                ticker.tick().await;
                sweep_expired(&sweep_state).await;
            }
        });

        let state = self.state.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                };

                let io = TokioIo::new(stream);
                let state = state.clone();

                tokio::spawn(async move {
                    let service = service_fn(|req| {
                        let state = state.clone();
                        async move { handle_request(req, state).await }
                    });

                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        if !e.to_string().contains("connection closed") {
                            error!("Error serving connection: {}", e);
                        }
                    }
                });
            }
        });

        Ok(())
    }

    /// Get server port
    pub async fn get_port(&self) -> u16 {
        *self.port.read().await
    }

    /// Page URL for the running server
    pub async fn url(&self) -> String {
        format!("http://localhost:{}/", self.get_port().await)
    }

    /// Create a new isolated form session
    pub async fn create_session(&self) -> String {
        create_session(&self.state).await
    }

    /// Discard a session and its credential
    pub async fn end_session(&self, session_id: &str) -> bool {
        self.state.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.state.sessions.read().await.len()
    }

    /// Drop idle sessions that have outlived the TTL.
    /// Also runs periodically once the server is started.
    pub async fn sweep_expired(&self) -> usize {
        sweep_expired(&self.state).await
    }
}

async fn create_session(state: &ServerState) -> String {
    sweep_expired(state).await;

    let session_id = Uuid::new_v4().to_string();
    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id.clone(), SessionEntry::new());
    }

    info!("Created session: {}", session_id);
    session_id
}

async fn sweep_expired(state: &ServerState) -> usize {
    let mut sessions = state.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, entry| !entry.is_expired(state.session_ttl));
    let removed = before - sessions.len();
    if removed > 0 {
        info!("Expired {} idle session(s)", removed);
    }
    removed
}

/// Look up a session, dropping it instead if it has been idle past the TTL
fn live_session<'a>(
    sessions: &'a mut HashMap<String, SessionEntry>,
    session_id: &str,
    ttl: Duration,
) -> Option<&'a mut SessionEntry> {
    if sessions.get(session_id)?.is_expired(ttl) {
        sessions.remove(session_id);
        info!("Session {} expired", session_id);
        return None;
    }
    sessions.get_mut(session_id)
}

/// Handle HTTP request
async fn handle_request(
    req: Request<Incoming>,
    state: ServerState,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|s| s.to_string());

    // Handle CORS preflight
    if method == Method::OPTIONS {
        return Ok(cors_response(
            Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::new()))
                .unwrap(),
        ));
    }

    let response = match (method, path.as_str()) {
        (Method::GET, "/") | (Method::GET, "/enhance") => serve_enhancer_ui(),
        (Method::POST, "/api/session") => handle_create_session(&state).await,
        (Method::GET, "/api/session") => get_session_data(query, &state).await,
        (Method::POST, "/api/submit") => handle_submit(req, &state).await,
        (Method::POST, "/api/end") => handle_end(req, &state).await,
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "text/plain")
            .body(Full::new(Bytes::from("Not Found")))
            .unwrap(),
    };

    Ok(cors_response(response))
}

/// Add CORS headers (restricted to localhost only)
pub fn cors_response(mut response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let headers = response.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        "http://localhost".parse().unwrap(),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        "GET, POST, OPTIONS".parse().unwrap(),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        "Content-Type".parse().unwrap(),
    );
    response
}

/// Serve Web UI HTML
pub fn serve_enhancer_ui() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(ENHANCER_UI_HTML)))
        .unwrap()
}

async fn handle_create_session(state: &ServerState) -> Response<Full<Bytes>> {
    let session_id = create_session(state).await;
    let view = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).map(|entry| entry.form.view())
    };

    json_value_response(
        StatusCode::OK,
        &json!({ "sessionId": session_id, "view": view }),
    )
}

/// Pull `session=<id>` out of a query string
pub fn parse_session_query(query: Option<&str>) -> Option<String> {
    query.and_then(|q| {
        q.split('&').find_map(|param| {
            let mut parts = param.splitn(2, '=');
            if parts.next()? == "session" {
                Some(parts.next()?.to_string())
            } else {
                None
            }
        })
    })
}

/// Get session data
async fn get_session_data(query: Option<String>, state: &ServerState) -> Response<Full<Bytes>> {
    let session_id = match parse_session_query(query.as_deref()) {
        Some(id) => id,
        None => return json_error_response(StatusCode::BAD_REQUEST, "Session ID is required"),
    };

    let mut sessions = state.sessions.write().await;
    let entry = match live_session(&mut sessions, &session_id, state.session_ttl) {
        Some(e) => e,
        None => return json_error_response(StatusCode::NOT_FOUND, "Session not found"),
    };
    entry.touch();

    json_value_response(
        StatusCode::OK,
        &json!({ "sessionId": session_id, "view": entry.form.view() }),
    )
}

fn default_true() -> bool {
    true
}

/// Full form as posted by the page
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub session_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub task: String,
    #[serde(default = "default_true")]
    pub include_examples: bool,
    #[serde(default = "default_true")]
    pub include_steps: bool,
    #[serde(default)]
    pub response_length: Option<String>,
}

impl SubmitRequest {
    fn options(&self) -> Result<EnhancementOptions, String> {
        let response_length = match self.response_length.as_deref() {
            None => ResponseLength::default(),
            Some(s) => ResponseLength::parse(s)
                .ok_or_else(|| format!("Invalid response length: {}", s))?,
        };
        Ok(EnhancementOptions {
            include_examples: self.include_examples,
            include_steps: self.include_steps,
            response_length,
        })
    }
}

/// Handle the "Enhance Prompt" trigger
async fn handle_submit(req: Request<Incoming>, state: &ServerState) -> Response<Full<Bytes>> {
    let body = match read_body_with_limit(req, MAX_BODY_SIZE).await {
        Ok(b) => b,
        Err(e) => return json_error_response(StatusCode::BAD_REQUEST, &e),
    };

    let submit: SubmitRequest = match serde_json::from_slice(&body) {
        Ok(s) => s,
        Err(_) => return json_error_response(StatusCode::BAD_REQUEST, "Invalid request body"),
    };

    let options = match submit.options() {
        Ok(o) => o,
        Err(e) => return json_error_response(StatusCode::BAD_REQUEST, &e),
    };

    // Capture the form and mark the session busy; the lock is not held across the call
    let pending = {
        let mut sessions = state.sessions.write().await;
        let entry = match live_session(&mut sessions, &submit.session_id, state.session_ttl) {
            Some(e) => e,
            None => return json_error_response(StatusCode::NOT_FOUND, "Session not found"),
        };
        entry.touch();

        if entry.form.is_busy() {
            return submit_error_response(&SubmitError::Busy, Some(&entry.form));
        }

        entry.form.set_credential(Credential::new(submit.api_key));
        entry.form.set_components(PromptComponents::new(
            submit.role,
            submit.context,
            submit.task,
        ));
        entry.form.set_options(options);

        match entry.form.begin_submit() {
            Ok(p) => p,
            Err(e) => return submit_error_response(&e, Some(&entry.form)),
        }
    };

    info!("Enhancing prompt for session {}", submit.session_id);

    // Runs to completion even if the client goes away, so the session never stays busy
    let task_state = state.clone();
    let session_id = submit.session_id.clone();
    let task = tokio::spawn(async move {
        let outcome = task_state
            .enhancer
            .enhance(&pending.credential, &pending.components, &pending.options)
            .await;

        let mut sessions = task_state.sessions.write().await;
        match sessions.get_mut(&session_id) {
            Some(entry) => {
                entry.touch();
                let result = entry.form.finish_submit(outcome);
                Some((result, entry.form.view()))
            }
            None => {
                warn!("Session {} ended before enhancement finished", session_id);
                None
            }
        }
    });

    match task.await {
        Ok(Some((Ok(_), view))) => {
            info!("Session {} enhanced successfully", submit.session_id);
            json_value_response(StatusCode::OK, &json!({ "view": view }))
        }
        Ok(Some((Err(e), view))) => {
            error!("Enhancement failed for session {}: {}", submit.session_id, e);
            json_value_response(
                submit_error_status(&e),
                &json!({
                    "error": e.to_string(),
                    "guidance": view.error.as_ref().and_then(|d| d.guidance.clone()),
                    "view": view,
                }),
            )
        }
        Ok(None) => json_error_response(StatusCode::NOT_FOUND, "Session not found"),
        Err(e) => {
            error!("Enhancement task failed: {}", e);
            json_error_response(StatusCode::INTERNAL_SERVER_ERROR, "Enhancement task failed")
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndRequest {
    session_id: String,
}

/// Discard a session when the page is closed
async fn handle_end(req: Request<Incoming>, state: &ServerState) -> Response<Full<Bytes>> {
    let body = match read_body_with_limit(req, MAX_BODY_SIZE).await {
        Ok(b) => b,
        Err(e) => return json_error_response(StatusCode::BAD_REQUEST, &e),
    };

    let end: EndRequest = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(_) => return json_error_response(StatusCode::BAD_REQUEST, "Invalid request body"),
    };

    let removed = state.sessions.write().await.remove(&end.session_id).is_some();
    if removed {
        info!("Session {} ended", end.session_id);
        json_value_response(StatusCode::OK, &json!({ "success": true }))
    } else {
        json_error_response(StatusCode::NOT_FOUND, "Session not found")
    }
}

/// HTTP status for a submit failure
pub fn submit_error_status(err: &SubmitError) -> StatusCode {
    match err {
        SubmitError::Validation(_) => StatusCode::BAD_REQUEST,
        SubmitError::Busy => StatusCode::CONFLICT,
        SubmitError::Enhancement(_) => StatusCode::BAD_GATEWAY,
    }
}

fn submit_error_response(err: &SubmitError, form: Option<&FormSession>) -> Response<Full<Bytes>> {
    json_value_response(
        submit_error_status(err),
        &json!({
            "error": err.to_string(),
            "view": form.map(|f| f.view()),
        }),
    )
}

/// Read request body with size limit (streaming enforcement to prevent memory exhaustion)
async fn read_body_with_limit(req: Request<Incoming>, max_size: usize) -> Result<Bytes, String> {
    let limited = Limited::new(req.into_body(), max_size);
    match limited.collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) => {
            let err_str = e.to_string();
            if err_str.contains("length limit exceeded") {
                Err(format!("Request body too large (max {} bytes)", max_size))
            } else {
                Err("Failed to read body".to_string())
            }
        }
    }
}

/// Create JSON error response with safe serialization
pub fn json_error_response(status: StatusCode, error: &str) -> Response<Full<Bytes>> {
    json_value_response(status, &json!({ "error": error }))
}

fn json_value_response(status: StatusCode, value: &Value) -> Response<Full<Bytes>> {
    json_response(status, &value.to_string())
}

/// Create JSON response
pub fn json_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
