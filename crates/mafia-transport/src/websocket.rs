//! WebSocket transport on `tokio-tungstenite`.
//!
//! A connection is split into its write half and its read half, each
//! behind its own lock, so a task parked in [`Connection::recv`] never holds
//! up a concurrent [`Connection::send`].

use std::net::SocketAddr;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Connection, ConnectionId, Handshake, Transport, TransportError};

/// The client side of a connection, as returned by
/// [`ClientConnection::connect`].
pub type ClientConnection = WebSocketConnection<MaybeTlsStream<TcpStream>>;

/// Listens for WebSocket clients.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds the listening socket. `addr` may use port 0.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let bind_error = |source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local = listener.local_addr().map_err(bind_error)?;
        tracing::info!(%local, "listening for WebSocket clients");
        Ok(Self { listener })
    }
}

impl Transport for WebSocketTransport {
    type Incoming = PendingWebSocket;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Incoming, Self::Error> {
        let (tcp, peer) = self
            .listener
            .accept()
            .await
            .map_err(|e| TransportError::Accept(e.into()))?;
        tracing::trace!(%peer, "tcp accepted");
        Ok(PendingWebSocket { tcp, peer })
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// A TCP client that still has to send its WebSocket upgrade request.
pub struct PendingWebSocket {
    tcp: TcpStream,
    peer: SocketAddr,
}

impl PendingWebSocket {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Handshake for PendingWebSocket {
    type Connection = WebSocketConnection<TcpStream>;
    type Error = TransportError;

    async fn handshake(self) -> Result<Self::Connection, Self::Error> {
        let ws = tokio_tungstenite::accept_async(self.tcp)
            .await
            .map_err(|e| TransportError::Accept(e.into()))?;

        let conn = WebSocketConnection::new(ws);
        tracing::debug!(conn_id = %conn.id, peer = %self.peer, "client connected");
        Ok(conn)
    }
}

/// One WebSocket connection. `S` is a plain `TcpStream` on the server and a
/// `MaybeTlsStream` on the client.
pub struct WebSocketConnection<S> {
    id: ConnectionId,
    writer: Mutex<SplitSink<WebSocketStream<S>, Message>>,
    reader: Mutex<SplitStream<WebSocketStream<S>>>,
}

impl<S> WebSocketConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn new(ws: WebSocketStream<S>) -> Self {
        let (writer, reader) = ws.split();
        Self {
            id: ConnectionId::next(),
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        }
    }
}

impl ClientConnection {
    /// Connects to a server. `addr` is either `host:port` or a full
    /// `ws://`/`wss://` URL.
    ///
    /// # Errors
    /// [`TransportError::Connect`] when the server can't be reached or
    /// refuses the upgrade.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let url = if addr.starts_with("ws://") || addr.starts_with("wss://") {
            addr.to_string()
        } else {
            format!("ws://{addr}")
        };

        let (ws, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect {
                url: url.clone(),
                source: e.into(),
            })?;

        let conn = Self::new(ws);
        tracing::debug!(conn_id = %conn.id, %url, "connected to server");
        Ok(conn)
    }
}

impl<S> Connection for WebSocketConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Error = TransportError;

    async fn send(&self, frame: &[u8]) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .send(Message::Binary(frame.to_vec().into()))
            .await
            .map_err(|e| TransportError::Send(e.into()))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut reader = self.reader.lock().await;
        while let Some(message) = reader.next().await {
            match message.map_err(|e| TransportError::Receive(e.into()))? {
                Message::Binary(data) => return Ok(Some(data.into())),
                Message::Text(text) => return Ok(Some(text.as_bytes().to_vec())),
                Message::Close(_) => return Ok(None),
                // Pings are answered by tungstenite itself.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .close()
            .await
            .map_err(|e| TransportError::Send(e.into()))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
