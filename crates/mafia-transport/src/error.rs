use std::io;

/// Boxed source error, so the WebSocket library's error type stays out of
/// the public API.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Transport failures. Every variant means the frame or connection is lost.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listening socket could not be bound.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// A TCP accept or the WebSocket upgrade after it failed.
    #[error("accept failed: {0}")]
    Accept(#[source] BoxError),

    /// A client could not open a connection to the server.
    #[error("cannot connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: BoxError,
    },

    /// Writing a frame failed; the peer is usually gone.
    #[error("send failed: {0}")]
    Send(#[source] BoxError),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    Receive(#[source] BoxError),
}

impl TransportError {
    /// Returns `true` if this error came from opening a client connection.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }
}
