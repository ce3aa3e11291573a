//! Core protocol types for Standoff's wire format.
//!
//! Every type here is serialized onto the wire, so field names and serde
//! tagging are part of the client contract.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A player's chosen alias. Unique among active players, case-sensitive,
/// and fixed for as long as the player stays in the session.
///
/// Serializes as a plain JSON string.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    /// Wraps a name. No validation happens here; the session decides
    /// what names it admits.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for PlayerName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Lets `HashMap<PlayerName, _>` be queried with a `&str`.
impl Borrow<str> for PlayerName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// The three choices a player has each round, without a target.
///
/// This is what a client sends; the target travels alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Shoot,
    Reload,
    Block,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shoot => write!(f, "Shoot"),
            Self::Reload => write!(f, "Reload"),
            Self::Block => write!(f, "Block"),
        }
    }
}

/// A validated action: a `Shoot` always names its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Action {
    Shoot { target: PlayerName },
    Reload,
    Block,
}

impl Action {
    /// Builds an action from the loose `(kind, target)` pair clients send.
    ///
    /// Returns `None` for a `Shoot` without a target. A target sent with
    /// `Reload` or `Block` is ignored.
    pub fn from_parts(
        kind: ActionKind,
        target: Option<PlayerName>,
    ) -> Option<Self> {
        match kind {
            ActionKind::Shoot => target.map(|target| Self::Shoot { target }),
            ActionKind::Reload => Some(Self::Reload),
            ActionKind::Block => Some(Self::Block),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Shoot { .. } => ActionKind::Shoot,
            Self::Reload => ActionKind::Reload,
            Self::Block => ActionKind::Block,
        }
    }

    /// The player being shot at, if this is a `Shoot`.
    pub fn target(&self) -> Option<&PlayerName> {
        match self {
            Self::Shoot { target } => Some(target),
            Self::Reload | Self::Block => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a join was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinRejection {
    /// Another active player already uses this name.
    NameInUse,
    /// A game is running; joins are only accepted in the lobby.
    GameInProgress,
    /// The name is blank, too long, or contains control characters.
    InvalidName,
}

impl fmt::Display for JoinRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameInUse => write!(f, "Name already in use."),
            Self::GameInProgress => write!(f, "Game currently in progress."),
            Self::InvalidName => write!(f, "Name is not allowed."),
        }
    }
}

/// Where a player stands once a round (or a departure) has been settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Standing {
    /// Still in the game.
    #[default]
    Alive,
    /// Health reached zero; the player has been removed.
    Eliminated,
    /// Everyone else is gone. The game is over and this player won.
    LastStanding,
}

// ---------------------------------------------------------------------------
// Notification: server-initiated pushes
// ---------------------------------------------------------------------------

/// A one-way push from the session to a single player.
///
/// Internally tagged: `{ "type": "RoundReset", "ammo": 1 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    /// The game has started. `you` is the recipient's own name.
    GameStarted { you: PlayerName },

    /// The active player list changed, in join order.
    PlayerListChanged { names: Vec<PlayerName> },

    /// A round was resolved.
    ///
    /// `narration` is written for this recipient: their own result first,
    /// then one line per other player. `health` and `ammo` are the
    /// server's values after the round.
    RoundResult {
        narration: Vec<String>,
        health_lost: u32,
        health: u32,
        ammo: u32,
        standing: Standing,
    },

    /// Someone left mid-round. Pending actions were discarded and `ammo`
    /// is the recipient's value after their own action was rolled back.
    RoundReset { ammo: u32 },
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Requests a client can make.
///
/// `Leave` and `TakeAction` act on the name the connection joined with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    Join { name: PlayerName },
    Leave { died: bool },
    StartGame,
    TakeAction {
        action: ActionKind,
        #[serde(default)]
        target: Option<PlayerName>,
    },
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Everything the server writes to a connection.
///
/// Adjacently tagged so replies and pushes share one stream:
///   `{ "type": "Notification", "data": { "type": "RoundReset", "ammo": 1 } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// Reply to `Join`. `error: None` means the player is in.
    JoinResult { error: Option<JoinRejection> },

    /// Reply to `StartGame`. `false` is a normal outcome, not an error.
    StartGameResult { started: bool },

    /// A session push.
    Notification(Notification),

    /// A request was refused. `code` follows HTTP conventions
    /// (400 malformed, 403 not joined, 409 conflict, 422 rejected action).
    Error { code: u16, message: String },
}

impl From<Notification> for ServerMessage {
    fn from(notification: Notification) -> Self {
        Self::Notification(notification)
    }
}

// =========================================================================
// Tests
// =========================================================================
