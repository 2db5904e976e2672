//! Session lifecycle notifications.
//!
//! The client never navigates anywhere on its own. When a session cannot be
//! recovered it clears the stored credentials and broadcasts
//! `SessionEvent::Expired`; the hosting application decides what to show.

use tokio::sync::broadcast;
use tracing::trace;

/// Buffered events per subscriber before the oldest are dropped
const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    Refreshed,
    LoggedOut,
    Expired(ExpiryReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// A 401 arrived and no refresh token was stored
    MissingRefreshToken,
    /// The refresh endpoint rejected the refresh token
    RefreshRejected,
    /// The request was rejected again after a successful refresh
    ReplayRejected,
}

impl ExpiryReason {
    pub fn describe(&self) -> &'static str {
        match self {
            ExpiryReason::MissingRefreshToken => "no refresh token available",
            ExpiryReason::RefreshRejected => "refresh token was rejected",
            ExpiryReason::ReplayRejected => "request rejected after refresh",
        }
    }
}

/// Cheap to clone; every clone publishes to the same subscribers.
#[derive(Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        // No subscribers is not an error
        if self.tx.send(event).is_err() {
            trace!(?event, "No session event subscribers");
        }
    }
}
