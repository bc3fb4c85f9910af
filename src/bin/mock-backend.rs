//! Echo backend for running the gateway locally.
//!
//! Every JSON answer names the service instance, so it is obvious which
//! upstream a request landed on.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mock-backend")]
#[command(about = "Echo backend for local gateway runs", long_about = None)]
struct Cli {
    #[arg(short, long, env = "PORT", default_value_t = 9000)]
    port: u16,

    #[arg(short, long, env = "SERVICE_NAME", default_value = "mock-backend")]
    service_name: String,
}

#[derive(Clone)]
struct AppState {
    service: String,
}

#[derive(Serialize)]
struct EchoResponse {
    service: String,
    message: String,
    method: String,
    path: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,
    timestamp: u64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

#[derive(Deserialize)]
struct SlowParams {
    ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let state = AppState {
        service: cli.service_name,
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/echo", any(echo))
        .route("/api/users", any(users))
        .route("/api/protected", any(protected))
        .route("/api/error", any(failure))
        .route("/api/slow", any(slow))
        .fallback(catch_all)
        .with_state(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(service = %state.service, address = %addr, "Mock backend listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn reply(
    state: &AppState,
    message: impl Into<String>,
    method: &Method,
    uri: &Uri,
    headers: BTreeMap<String, String>,
) -> EchoResponse {
    EchoResponse {
        service: state.service.clone(),
        message: message.into(),
        method: method.to_string(),
        path: uri.path().to_string(),
        headers,
        timestamp: now(),
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy", "service": state.service }))
}

async fn echo(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    Json(reply(&state, "echo response", &method, &uri, headers))
}

async fn users(State(state): State<AppState>, method: Method, uri: Uri) -> impl IntoResponse {
    match method {
        Method::GET => Json(serde_json::json!([
            { "id": 1, "name": "John Doe", "email": "john@example.com" },
            { "id": 2, "name": "Jane Smith", "email": "jane@example.com" },
        ]))
        .into_response(),
        Method::POST => (
            StatusCode::CREATED,
            Json(reply(&state, "user created", &method, &uri, BTreeMap::new())),
        )
            .into_response(),
        _ => (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(ErrorResponse {
                error: "method_not_allowed",
                message: format!("method {method} not allowed"),
            }),
        )
            .into_response(),
    }
}

async fn protected(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if authorization.is_empty() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "unauthorized",
                message: "authorization header required".into(),
            }),
        )
            .into_response();
    }

    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let echoed = BTreeMap::from([
        ("Authorization".to_string(), authorization.to_string()),
        ("X-User-Id".to_string(), user_id.to_string()),
    ]);

    Json(reply(
        &state,
        format!("protected resource accessed by user {user_id}"),
        &method,
        &uri,
        echoed,
    ))
    .into_response()
}

async fn failure() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal_error",
            message: "simulated backend error".into(),
        }),
    )
}

async fn slow(
    State(state): State<AppState>,
    Query(params): Query<SlowParams>,
    method: Method,
    uri: Uri,
) -> impl IntoResponse {
    let delay = Duration::from_millis(params.ms.unwrap_or(5_000));
    tokio::time::sleep(delay).await;
    Json(reply(&state, "slow response", &method, &uri, BTreeMap::new()))
}

async fn catch_all(State(state): State<AppState>, method: Method, uri: Uri) -> impl IntoResponse {
    Json(reply(&state, "catch-all handler", &method, &uri, BTreeMap::new()))
}
