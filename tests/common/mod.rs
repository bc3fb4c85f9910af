//! Shared utilities for integration tests.
//!
//! Every server binds `127.0.0.1:0`, so tests never fight over ports.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use api_gateway::auth::{Metadata, TokenManager};
use api_gateway::config::TargetConfig;
use api_gateway::{GatewayConfig, GatewayServer, Shutdown};
use axum::{
    http::{HeaderMap, Method, Uri},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const JWT_SECRET: &str = "integration-secret";

/// What the echo backend saw.
#[derive(Debug, Serialize, Deserialize)]
pub struct Echo {
    pub service: String,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Lower-cased header name to every value received.
    pub headers: BTreeMap<String, Vec<String>>,
}

impl Echo {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn header_count(&self, name: &str) -> usize {
        self.headers.get(name).map_or(0, Vec::len)
    }
}

/// Start a backend that answers every request with an [`Echo`] of it.
pub async fn start_echo_backend(service: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap| async move {
            let mut seen: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (name, value) in &headers {
                seen.entry(name.to_string())
                    .or_default()
                    .push(value.to_str().unwrap_or_default().to_string());
            }
            Json(Echo {
                service: service.to_string(),
                method: method.to_string(),
                path: uri.path().to_string(),
                query: uri.query().map(str::to_string),
                headers: seen,
            })
        },
    );

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a programmable mock backend with async support.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                // Consume the request head so closing does not reset the socket.
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;

                let (status, body) = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// Start a backend that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// Start a backend that reads each request and closes without answering.
pub async fn start_resetting_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 8192];
            let _ = socket.read(&mut buf).await;
            drop(socket);
        }
    });
    addr
}

/// Start a backend that sends a response head and part of the body, then stalls.
pub async fn start_stalled_body_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 8192];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
                .await;
            held.push(socket);
        }
    });
    addr
}

/// An address with nothing listening on it.
pub fn refused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Config with a known secret and the given `name -> backend` targets.
pub fn gateway_config(targets: &[(&str, SocketAddr)]) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.jwt.secret = JWT_SECRET.to_string();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.observability.metrics_enabled = false;
    config.server.shutdown_grace_secs = 2;
    for (name, addr) in targets {
        config.proxy.targets.insert(
            name.to_string(),
            TargetConfig {
                url: format!("http://{addr}"),
            },
        );
    }
    config
}

/// A gateway running on a real listener.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub config: GatewayConfig,
    /// Dropping the coordinator stops the server, so the handle owns it.
    pub shutdown: Shutdown,
    pub task: JoinHandle<()>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn token(&self, user_id: &str) -> String {
        token_for(&self.config, user_id)
    }
}

pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let server = GatewayServer::new(config.clone()).expect("gateway config is valid");
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    let task = tokio::spawn(async move {
        server.run(listener, server_shutdown).await.unwrap();
    });

    TestGateway {
        addr,
        config,
        shutdown,
        task,
    }
}

pub fn token_for(config: &GatewayConfig, user_id: &str) -> String {
    TokenManager::new(config.jwt.token_config())
        .unwrap()
        .issue(user_id, Metadata::new())
        .unwrap()
}

/// Client without connection pooling or system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
