//! Error types for the session layer.

use standoff_protocol::{JoinRejection, PlayerName};

/// Errors returned by session operations.
///
/// None of these are fatal: a rejected request leaves the session exactly
/// as it was, and other players are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Another active player already uses this name.
    #[error("name {0} is already in use")]
    NameInUse(PlayerName),

    /// Joins are only accepted in the lobby.
    #[error("a game is currently in progress")]
    GameInProgress,

    /// The name is blank, too long, or contains control characters.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The submitting player is not in the session.
    #[error("player {0} is not in the session")]
    UnknownPlayer(PlayerName),

    /// The player already acted this round.
    #[error("player {0} already acted this round")]
    DuplicateSubmission(PlayerName),

    /// A shot without a target, at an absent player, or at oneself.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// A shot with an empty gun.
    #[error("player {0} has no ammo")]
    InsufficientAmmo(PlayerName),

    /// Actions are only accepted while a game is running.
    #[error("no game is in progress")]
    NotInProgress,

    /// The session actor has stopped or its channel is closed.
    #[error("session is unavailable")]
    Unavailable,
}

impl SessionError {
    /// The wire-level reason for a refused join, if this is one.
    pub fn join_rejection(&self) -> Option<JoinRejection> {
        match self {
            Self::NameInUse(_) => Some(JoinRejection::NameInUse),
            Self::GameInProgress => Some(JoinRejection::GameInProgress),
            Self::InvalidName(_) => Some(JoinRejection::InvalidName),
            _ => None,
        }
    }
}
