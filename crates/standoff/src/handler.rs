//! Per-connection handler: decode requests, call the session, write back.
//!
//! Each connection is split in two. A writer task owns the outgoing half
//! and drains an unbounded queue of [`ServerMessage`]s; the reader loop
//! below owns the incoming half. Both replies and session pushes go
//! through the same queue, and the session delivers a command's
//! notifications before it answers, so a client always sees the pushes a
//! request caused ahead of the reply to that request.
//!
//! A joined connection holds a [`Seat`]. Leaves and actions are sent with
//! the seat's sink, so the session ignores them once the name belongs to
//! someone else. The seat is dropped when the session eliminates its
//! player, which frees the connection to join again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use standoff_protocol::{
    ClientMessage, Codec, Notification, PlayerName, ServerMessage, Standing,
};
use standoff_session::{
    NotificationSink, SessionError, SharedSink, SinkClosed,
};
use standoff_transport::{FrameWriter, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::StandoffError;

type Outgoing = mpsc::UnboundedSender<ServerMessage>;

/// Routes session notifications into a connection's outgoing queue.
struct OutboundSink {
    out: Outgoing,
    /// Set once this player's elimination result has passed through.
    evicted: AtomicBool,
}

impl NotificationSink for OutboundSink {
    fn push(&self, notification: Notification) -> Result<(), SinkClosed> {
        if matches!(
            notification,
            Notification::RoundResult {
                standing: Standing::Eliminated,
                ..
            }
        ) {
            self.evicted.store(true, Ordering::Release);
        }
        self.out.send(notification.into()).map_err(|_| SinkClosed)
    }
}

/// The name a connection joined with, and the sink it joined through.
struct Seat {
    name: PlayerName,
    sink: Arc<OutboundSink>,
}

impl Seat {
    fn sink(&self) -> SharedSink {
        Arc::clone(&self.sink) as SharedSink
    }

    fn is_evicted(&self) -> bool {
        self.sink.evicted.load(Ordering::Acquire)
    }
}

/// Handles a single connection from accept to close.
///
/// A connection that drops while joined is treated as a non-fatal leave.
pub(crate) async fn handle_connection<C: Codec + Clone>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), StandoffError> {
    let conn_id = conn.id();
    tracing::debug!(
        %conn_id,
        peer = %conn.peer_addr(),
        "handling new connection"
    );

    let (mut reader, writer) = conn.split();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    tokio::spawn(write_loop(writer, out_rx, state.codec.clone()));

    let mut joined: Option<Seat> = None;
    let result = loop {
        let data = match reader.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break Ok(());
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break Ok(());
            }
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "undecodable message");
                reply_error(&out_tx, 400, format!("invalid message: {e}"));
                continue;
            }
        };

        if let Err(e) = dispatch(&state, &out_tx, &mut joined, msg).await {
            break Err(e);
        }
    };

    if let Some(seat) = joined.take() {
        tracing::info!(
            %conn_id,
            player = %seat.name,
            "connection gone, leaving"
        );
        let _ = state
            .session
            .leave_from(&seat.sink(), seat.name, false)
            .await;
    }
    result
}

/// Handles one decoded request. Only a stopped session is an error here;
/// everything else becomes a reply.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    out: &Outgoing,
    joined: &mut Option<Seat>,
    msg: ClientMessage,
) -> Result<(), StandoffError> {
    if let Some(seat) = joined.take_if(|seat| seat.is_evicted()) {
        tracing::debug!(player = %seat.name, "eliminated, seat released");
    }

    match msg {
        ClientMessage::Join { name } => {
            if let Some(current) = joined.as_ref() {
                tracing::warn!(
                    player = %current.name,
                    "second join on connection"
                );
                reply_error(out, 409, "already joined".to_string());
                return Ok(());
            }
            let sink = Arc::new(OutboundSink {
                out: out.clone(),
                evicted: AtomicBool::new(false),
            });
            let seat = Seat { name, sink };
            match state.session.join(seat.name.clone(), seat.sink()).await {
                Ok(()) => {
                    tracing::debug!(player = %seat.name, "joined");
                    *joined = Some(seat);
                    reply(out, ServerMessage::JoinResult { error: None });
                }
                Err(e) => match e.join_rejection() {
                    Some(rejection) => reply(
                        out,
                        ServerMessage::JoinResult {
                            error: Some(rejection),
                        },
                    ),
                    None => return Err(e.into()),
                },
            }
        }

        ClientMessage::Leave { died } => {
            let Some(seat) = joined.take() else {
                tracing::warn!("leave from a connection that never joined");
                reply_error(out, 403, "join before leaving".to_string());
                return Ok(());
            };
            state.session.leave_from(&seat.sink(), seat.name, died).await?;
        }

        ClientMessage::StartGame => {
            let started = state.session.start_game().await?;
            reply(out, ServerMessage::StartGameResult { started });
        }

        ClientMessage::TakeAction { action, target } => {
            let Some(seat) = joined.as_ref() else {
                tracing::warn!("action from a connection that never joined");
                reply_error(out, 403, "join before acting".to_string());
                return Ok(());
            };
            match state
                .session
                .take_action_from(
                    &seat.sink(),
                    seat.name.clone(),
                    action,
                    target,
                )
                .await
            {
                Ok(_) => {}
                Err(SessionError::Unavailable) => {
                    return Err(SessionError::Unavailable.into());
                }
                Err(e) => reply_error(out, 422, e.to_string()),
            }
        }
    }
    Ok(())
}

/// Drains the outgoing queue onto the socket until every sender is gone
/// or the peer stops accepting frames.
async fn write_loop<C: Codec>(
    mut writer: FrameWriter,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    codec: C,
) {
    let conn_id = writer.id();
    while let Some(msg) = rx.recv().await {
        let bytes = match codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "encode failed");
                continue;
            }
        };
        if let Err(e) = writer.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed");
            return;
        }
    }
    let _ = writer.close().await;
}

fn reply(out: &Outgoing, msg: ServerMessage) {
    // The writer only stops once the peer is gone.
    let _ = out.send(msg);
}

fn reply_error(out: &Outgoing, code: u16, message: String) {
    reply(out, ServerMessage::Error { code, message });
}
