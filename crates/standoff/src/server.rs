//! `StandoffServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session. There is one
//! session per server; every connection talks to it through a cloned
//! [`SessionHandle`].

use std::sync::Arc;

use standoff_protocol::{Codec, JsonCodec};
use standoff_session::{spawn_session, SessionConfig, SessionHandle};
use standoff_transport::WebSocketListener;

use crate::handler::handle_connection;
use crate::StandoffError;

/// Address used when none is configured.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// State shared by every connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) session: SessionHandle,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a server.
///
/// # Example
///
/// ```rust,ignore
/// let server = StandoffServerBuilder::new()
///     .bind("127.0.0.1:9000")
///     .session_config(SessionConfig {
///         starting_health: 5,
///         ..Default::default()
///     })
///     .build()
///     .await?;
/// ```
pub struct StandoffServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
}

impl StandoffServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to listen on. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds the listener and spawns the session actor.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn build(
        self,
    ) -> Result<StandoffServer<JsonCodec>, StandoffError> {
        let listener = WebSocketListener::bind(&self.bind_addr).await?;
        let session = spawn_session(self.session_config);

        Ok(StandoffServer {
            listener,
            state: Arc::new(ServerState {
                session,
                codec: JsonCodec,
            }),
        })
    }
}

impl Default for StandoffServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server. Call [`run()`](Self::run) to start accepting players.
pub struct StandoffServer<C: Codec = JsonCodec> {
    listener: WebSocketListener,
    state: Arc<ServerState<C>>,
}

impl StandoffServer<JsonCodec> {
    pub fn builder() -> StandoffServerBuilder {
        StandoffServerBuilder::new()
    }
}

impl<C: Codec + Clone> StandoffServer<C> {
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// A handle to the server's session, for inspection or shutdown.
    pub fn session(&self) -> SessionHandle {
        self.state.session.clone()
    }

    /// Runs the accept loop, spawning one handler task per connection.
    ///
    /// Runs until the process is terminated; a failed accept is logged
    /// and skipped.
    pub async fn run(self) -> Result<(), StandoffError> {
        tracing::info!("standoff server running");

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
