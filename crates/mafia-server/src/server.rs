//! `MafiaServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session core.

use std::sync::Arc;

use mafia_protocol::{Codec, JsonCodec};
use mafia_session::SessionRegistry;
use mafia_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_incoming;
use crate::{GameSettings, MafiaError};

/// The registry as shared between the server and everyone who drives games.
pub type SharedRegistry = Arc<Mutex<SessionRegistry>>;

/// What every connection task gets a reference to.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: SharedRegistry,
    pub(crate) settings: GameSettings,
    pub(crate) codec: C,
}

/// Configures and binds a [`MafiaServer`].
///
/// # Example
///
/// ```rust,no_run
/// use mafia_server::prelude::*;
///
/// # async fn run() -> Result<(), MafiaError> {
/// let server = MafiaServerBuilder::new()
///     .bind("0.0.0.0:5000")
///     .settings(GameSettings::default())
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct MafiaServerBuilder {
    bind_addr: String,
    settings: GameSettings,
    registry: Option<SharedRegistry>,
}

impl MafiaServerBuilder {
    /// Defaults: `127.0.0.1:5000`, default [`GameSettings`], fresh registry.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            settings: GameSettings::default(),
            registry: None,
        }
    }

    /// Listen address, `host:port`. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets seat counts and stream intervals.
    pub fn settings(mut self, settings: GameSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Uses an existing registry instead of a fresh one, e.g. one a rules
    /// engine already holds.
    pub fn registry(mut self, registry: SharedRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Binds the WebSocket listener. Frames are JSON.
    pub async fn build(self) -> Result<MafiaServer<JsonCodec>, MafiaError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(Mutex::new(SessionRegistry::new()))),
            settings: self.settings,
            codec: JsonCodec,
        });

        Ok(MafiaServer { transport, state })
    }
}

impl Default for MafiaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server; nothing is accepted until [`run`](Self::run).
pub struct MafiaServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl MafiaServer<JsonCodec> {
    /// Shorthand for [`MafiaServerBuilder::new`].
    pub fn builder() -> MafiaServerBuilder {
        MafiaServerBuilder::new()
    }
}

impl<C: Codec> MafiaServer<C> {
    /// The bound address, e.g. to learn the port after binding port 0.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the game registry.
    ///
    /// The rules engine uses this to find games and drive them through
    /// their [`SessionHandle`](mafia_session::SessionHandle)s.
    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.state.registry)
    }

    /// Accepts forever, one task per connection. The loop only takes the
    /// socket; the WebSocket handshake runs in the connection's task.
    /// Accept failures are logged and skipped.
    pub async fn run(mut self) -> Result<(), MafiaError> {
        tracing::info!(
            capacity = self.state.settings.roles.capacity(),
            update_interval = ?self.state.settings.update_interval,
            "mafia server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(incoming) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_incoming(incoming, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
