//! Session actor: one Tokio task that owns the [`Session`].
//!
//! Callers never touch session state directly. They hold a
//! [`SessionHandle`] and send commands over a channel; the actor handles
//! them strictly one at a time, which makes every command a critical
//! section. Notifications a command produces are delivered only after the
//! command has finished mutating state.

use std::sync::Arc;

use standoff_protocol::{ActionKind, PlayerName};
use tokio::sync::{mpsc, oneshot};

use crate::session::{Session, SessionInfo, Submission};
use crate::sink::{Outbox, SharedSink};
use crate::{SessionConfig, SessionError};

/// Commands sent to the session actor.
///
/// Variants with a `reply` are request/response; the rest are one-way.
/// `from`, when set, is the sink of the connection acting for `name`.
pub(crate) enum SessionCommand {
    Join {
        name: PlayerName,
        sink: SharedSink,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },

    Leave {
        name: PlayerName,
        died: bool,
        from: Option<SharedSink>,
    },

    StartGame {
        reply: oneshot::Sender<bool>,
    },

    TakeAction {
        name: PlayerName,
        kind: ActionKind,
        target: Option<PlayerName>,
        from: Option<SharedSink>,
        reply: oneshot::Sender<Result<Submission, SessionError>>,
    },

    Info {
        reply: oneshot::Sender<SessionInfo>,
    },

    Shutdown,
}

/// Handle to the running session actor.
///
/// Cheap to clone; every connection task holds one.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Joins the lobby. `sink` receives this player's notifications until
    /// they leave.
    pub async fn join(
        &self,
        name: PlayerName,
        sink: SharedSink,
    ) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionCommand::Join {
            name,
            sink,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| SessionError::Unavailable)?
    }

    /// Leaves the session (fire-and-forget). Unknown names are ignored.
    pub async fn leave(
        &self,
        name: PlayerName,
        died: bool,
    ) -> Result<(), SessionError> {
        self.send(SessionCommand::Leave {
            name,
            died,
            from: None,
        })
        .await
    }

    /// Leaves on behalf of the connection that joined with `sink`.
    /// Ignored unless `name` is still held by that sink.
    pub async fn leave_from(
        &self,
        sink: &SharedSink,
        name: PlayerName,
        died: bool,
    ) -> Result<(), SessionError> {
        self.send(SessionCommand::Leave {
            name,
            died,
            from: Some(Arc::clone(sink)),
        })
        .await
    }

    /// Tries to start a game. `Ok(false)` means the lobby isn't ready.
    pub async fn start_game(&self) -> Result<bool, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionCommand::StartGame { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| SessionError::Unavailable)
    }

    /// Submits this round's action and waits for the verdict.
    pub async fn take_action(
        &self,
        name: PlayerName,
        kind: ActionKind,
        target: Option<PlayerName>,
    ) -> Result<Submission, SessionError> {
        self.submit(name, kind, target, None).await
    }

    /// Like [`take_action`](Self::take_action), but refused with
    /// `UnknownPlayer` unless `name` is held by `sink`.
    pub async fn take_action_from(
        &self,
        sink: &SharedSink,
        name: PlayerName,
        kind: ActionKind,
        target: Option<PlayerName>,
    ) -> Result<Submission, SessionError> {
        self.submit(name, kind, target, Some(Arc::clone(sink))).await
    }

    async fn submit(
        &self,
        name: PlayerName,
        kind: ActionKind,
        target: Option<PlayerName>,
        from: Option<SharedSink>,
    ) -> Result<Submission, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionCommand::TakeAction {
            name,
            kind,
            target,
            from,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| SessionError::Unavailable)?
    }

    /// Snapshot of the session's state and players.
    pub async fn info(&self) -> Result<SessionInfo, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionCommand::Info { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| SessionError::Unavailable)
    }

    /// Stops the actor. Later calls on any handle fail with `Unavailable`.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Shutdown).await
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| SessionError::Unavailable)
    }
}

struct SessionActor {
    session: Session,
    receiver: mpsc::Receiver<SessionCommand>,
}

impl SessionActor {
    async fn run(mut self) {
        tracing::info!("session actor started");

        while let Some(command) = self.receiver.recv().await {
            let mut outbox = Outbox::new();
            match command {
                SessionCommand::Join { name, sink, reply } => {
                    let result =
                        self.session.join(name.clone(), sink, &mut outbox);
                    if let Err(e) = &result {
                        tracing::debug!(player = %name, error = %e, "join refused");
                    }
                    outbox.deliver();
                    let _ = reply.send(result);
                }
                SessionCommand::Leave { name, died, from } => {
                    let left = match &from {
                        Some(sink) => self.session.leave_from(
                            sink,
                            name.as_str(),
                            died,
                            &mut outbox,
                        ),
                        None => {
                            self.session.leave(name.as_str(), died, &mut outbox)
                        }
                    };
                    if !left {
                        tracing::debug!(player = %name, "leave ignored");
                    }
                    outbox.deliver();
                }
                SessionCommand::StartGame { reply } => {
                    let started = self.session.start_game(&mut outbox);
                    outbox.deliver();
                    let _ = reply.send(started);
                }
                SessionCommand::TakeAction {
                    name,
                    kind,
                    target,
                    from,
                    reply,
                } => {
                    let result = match &from {
                        Some(sink) => self.session.take_action_from(
                            sink,
                            name.as_str(),
                            kind,
                            target,
                            &mut outbox,
                        ),
                        None => self.session.take_action(
                            name.as_str(),
                            kind,
                            target,
                            &mut outbox,
                        ),
                    };
                    if let Err(e) = &result {
                        tracing::debug!(
                            player = %name,
                            action = %kind,
                            error = %e,
                            "action rejected"
                        );
                    }
                    outbox.deliver();
                    let _ = reply.send(result);
                }
                SessionCommand::Info { reply } => {
                    let _ = reply.send(self.session.info());
                }
                SessionCommand::Shutdown => {
                    tracing::info!("session shutting down");
                    break;
                }
            }
        }

        tracing::info!("session actor stopped");
    }
}

/// Spawns the session actor and returns a handle to it.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_session(config: SessionConfig) -> SessionHandle {
    let (tx, rx) = mpsc::channel(config.command_buffer.max(1));

    let actor = SessionActor {
        session: Session::new(config),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    SessionHandle { sender: tx }
}
