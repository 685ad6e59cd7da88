//! Frame transport for the mafia game server.
//!
//! Call handlers are written against [`Connection`], which moves opaque
//! frames, and the server accepts through [`Transport`]. The only
//! implementation is WebSocket.
//!
//! # Feature Flags
//!
//! - `websocket` (default): [`WebSocketTransport`] and
//!   [`WebSocketConnection`] via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::{BoxError, TransportError};
#[cfg(feature = "websocket")]
pub use websocket::{ClientConnection, PendingWebSocket, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique connection number, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

impl ConnectionId {
    /// Allocates the next id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Server side: a listener producing not-yet-upgraded connections.
pub trait Transport: Send + Sync + 'static {
    type Incoming: Handshake;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next client.
    ///
    /// Returns as soon as the socket is accepted. The protocol handshake is
    /// left to [`Handshake::handshake`], so a peer that never completes it
    /// only stalls its own task, not the accept loop.
    async fn accept(&mut self) -> Result<Self::Incoming, Self::Error>;

    /// The bound address. Useful when binding to port 0.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// An accepted socket whose handshake hasn't run yet.
pub trait Handshake: Send + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Completes the handshake. Callers bound this with a timeout.
    async fn handshake(self) -> Result<Self::Connection, Self::Error>;
}

/// One open connection.
///
/// `send` and `recv` take `&self` and must not block each other: a
/// streaming handler parks in `recv` to notice a disconnect while it keeps
/// pushing frames with `send`.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    async fn send(&self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Next frame from the peer, or `Ok(None)` once the peer has closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Starts the closing handshake.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
