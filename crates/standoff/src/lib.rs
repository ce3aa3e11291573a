//! # Standoff
//!
//! A WebSocket server for a simultaneous-turn party game. Each round every
//! player secretly picks Shoot, Reload, or Block; once the last player has
//! picked, the round resolves and everyone gets their own account of it.
//!
//! The server is a thin adapter. Each connection decodes
//! [`ClientMessage`](standoff_protocol::ClientMessage)s and turns them into
//! calls on a single [`SessionHandle`](standoff_session::SessionHandle);
//! everything game-related lives in `standoff-session`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use standoff::prelude::*;
//!
//! # async fn run() -> Result<(), StandoffError> {
//! let server = StandoffServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{load_session_config, parse_session_config};
pub use error::StandoffError;
pub use server::{StandoffServer, StandoffServerBuilder, DEFAULT_ADDR};

/// Everything needed to run a server or write a client against it.
pub mod prelude {
    pub use crate::{StandoffError, StandoffServer, StandoffServerBuilder};

    pub use standoff_protocol::{
        ActionKind, ClientMessage, Codec, JoinRejection, JsonCodec,
        Notification, PlayerName, ServerMessage, Standing,
    };
    pub use standoff_session::{SessionConfig, SessionHandle, SessionState};
}
