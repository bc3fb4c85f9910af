//! Transport-level facts about the inbound connection.
//!
//! # Responsibilities
//! - Capture the observed peer address at accept time
//! - Record whether the connection is encrypted
//! - Hand both to handlers via `ConnectInfo<ClientConnection>`
//!
//! These values come from the socket, never from request headers, which is
//! what makes them safe to forward as `X-Real-IP` / `X-Forwarded-Proto`.

use std::net::{IpAddr, SocketAddr};

use axum::extract::connect_info::Connected;
use axum::serve::IncomingStream;
use tokio::net::TcpListener;

/// Peer of an accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConnection {
    pub remote_addr: SocketAddr,
    pub secure: bool,
}

impl ClientConnection {
    /// A connection accepted on a plaintext listener.
    pub fn plaintext(remote_addr: SocketAddr) -> Self {
        Self {
            remote_addr,
            secure: false,
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.remote_addr.ip()
    }

    /// `https` for encrypted connections, `http` otherwise.
    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }
}

impl Connected<IncomingStream<'_, TcpListener>> for ClientConnection {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        ClientConnection::plaintext(*stream.remote_addr())
    }
}
