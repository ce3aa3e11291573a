//! Session configuration and lifecycle state.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Tunables for a session. `Default` gives the classic rules:
/// three lives, one bullet, games of two or more.
///
/// Deserializable so the server can read it from a file; fields left out
/// keep their default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Health every player starts a game with.
    pub starting_health: u32,

    /// Ammo every player starts a game with.
    pub starting_ammo: u32,

    /// Minimum players required for `StartGame` to succeed.
    pub min_players: usize,

    /// Longest accepted name, in characters.
    pub max_name_len: usize,

    /// Capacity of the actor's command channel. Callers wait when full.
    pub command_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_health: 3,
            starting_ammo: 1,
            min_players: 2,
            max_name_len: 15,
            command_buffer: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle state of the session.
///
/// ```text
///            StartGame (≥ min_players)
///   Lobby ───────────────────────────→ InProgress
///     ↑                                    │
///     └──── one or zero players left ──────┘
/// ```
///
/// - **Lobby**: accepting joins, waiting for someone to start.
/// - **InProgress**: rounds are being played; joins are refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Lobby,
    InProgress,
}

impl SessionState {
    /// Returns `true` if new players may join.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` if rounds are being played.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::InProgress => write!(f, "InProgress"),
        }
    }
}
