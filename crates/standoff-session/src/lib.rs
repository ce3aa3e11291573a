//! The Standoff session coordinator.
//!
//! Every round, each player privately picks Shoot, Reload, or Block. When
//! the last player has picked, the round is resolved and every player is
//! told what happened from their own point of view.
//!
//! # Key types
//!
//! - [`SessionHandle`]: the only way in; obtained from [`spawn_session`]
//! - [`Session`]: the state machine the actor drives
//! - [`PlayerRegistry`]: active players, their sinks, health, and ammo
//! - [`PendingRound`]: the turn barrier
//! - [`resolve`]: pure round resolution and per-viewer narration
//! - [`NotificationSink`] / [`Outbox`]: outbound delivery
//!
//! # Layering
//!
//! ```text
//! Server (above)   ← adapts connections to SessionHandle calls
//!     ↕
//! Session (this crate)   ← rounds, players, lobby lifecycle
//!     ↕
//! Protocol (below)   ← PlayerName, Action, Notification
//! ```

mod config;
mod coordinator;
mod error;
mod registry;
mod resolver;
mod round;
mod session;
mod sink;

pub use config::{SessionConfig, SessionState};
pub use coordinator::{spawn_session, SessionHandle};
pub use error::SessionError;
pub use registry::{validate_name, Player, PlayerRegistry};
pub use resolver::{
    resolve, PlayerOutcome, RoundOutcome, ShotResult, LAST_STANDING,
};
pub use round::PendingRound;
pub use session::{PlayerSnapshot, Session, SessionInfo, Submission};
pub use sink::{NotificationSink, Outbox, SharedSink, SinkClosed};
