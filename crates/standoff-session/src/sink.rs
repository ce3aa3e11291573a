//! Outbound notification delivery.
//!
//! The session never talks to a socket. Each player registers a
//! [`NotificationSink`]; while a command is being processed, notifications
//! are queued in an [`Outbox`], and the outbox is flushed only once the
//! command's state changes are complete. Pushing must not block, so one
//! stalled client can't hold up a round for everyone else.

use std::sync::Arc;

use standoff_protocol::{Notification, PlayerName};
use tokio::sync::mpsc;

/// The recipient has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("notification sink closed")]
pub struct SinkClosed;

/// Somewhere to push one player's notifications.
///
/// Implementations must return promptly. Buffer or drop, never wait on
/// the remote end.
pub trait NotificationSink: Send + Sync + 'static {
    fn push(&self, notification: Notification) -> Result<(), SinkClosed>;
}

/// Shared handle to a sink. The registry owns one per player; an outbox
/// clones it so delivery still works for a player removed mid-command.
pub type SharedSink = Arc<dyn NotificationSink>;

impl NotificationSink for mpsc::UnboundedSender<Notification> {
    fn push(&self, notification: Notification) -> Result<(), SinkClosed> {
        self.send(notification).map_err(|_| SinkClosed)
    }
}

struct Delivery {
    recipient: PlayerName,
    sink: SharedSink,
    notification: Notification,
}

/// Notifications produced by one command, delivered in queue order.
#[derive(Default)]
pub struct Outbox {
    deliveries: Vec<Delivery>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        recipient: &PlayerName,
        sink: &SharedSink,
        notification: Notification,
    ) {
        self.deliveries.push(Delivery {
            recipient: recipient.clone(),
            sink: Arc::clone(sink),
            notification,
        });
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// Notifications queued for one player, in order.
    #[cfg(test)]
    pub(crate) fn for_recipient<'a>(
        &'a self,
        recipient: &'a str,
    ) -> impl Iterator<Item = &'a Notification> + 'a {
        self.deliveries
            .iter()
            .filter(move |d| d.recipient.as_str() == recipient)
            .map(|d| &d.notification)
    }

    /// Pushes everything. Closed sinks are skipped.
    ///
    /// Returns how many notifications were accepted by their sinks.
    pub fn deliver(self) -> usize {
        let mut delivered = 0;
        for delivery in self.deliveries {
            match delivery.sink.push(delivery.notification) {
                Ok(()) => delivered += 1,
                Err(SinkClosed) => {
                    tracing::debug!(
                        player = %delivery.recipient,
                        "sink closed, notification dropped"
                    );
                }
            }
        }
        delivered
    }
}
