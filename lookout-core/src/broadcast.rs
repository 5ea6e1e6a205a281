//! Fan-out log broadcast to live subscribers.
//!
//! Subscribers are bounded mpsc channels keyed by [`SubscriberId`]. A
//! broadcast never blocks and never fails: a send that cannot complete,
//! because the receiver hung up or its buffer is full, removes that
//! subscriber during the same pass, so the set never accumulates dead
//! connections. Delivery is best-effort; nothing is persisted or
//! replayed for events a subscriber missed.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Default per-subscriber buffer, in events.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

/// One log line on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogEvent {
    /// Event stamped with the current wall clock.
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

/// Identifier of one streaming subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live subscription handed to the connection task.
///
/// Dropping the receiver is enough to leave: the next broadcast notices
/// the closed channel and removes the entry. [`LogBroadcaster::unsubscribe`]
/// removes it immediately instead.
pub struct Subscription {
    pub id: SubscriberId,
    pub rx: mpsc::Receiver<LogEvent>,
}

/// Registry of live log subscribers with best-effort fan-out.
pub struct LogBroadcaster {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<LogEvent>>>,
    buffer: usize,
}

impl LogBroadcaster {
    /// Create a broadcaster whose subscribers buffer `buffer` events each.
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            buffer,
        }
    }

    /// Register a new subscriber.
    ///
    /// The subscription starts with a connection acknowledgement already
    /// queued, ahead of any broadcast that begins after this call.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let _ = tx.try_send(LogEvent::now("log stream connected"));
        let id = SubscriberId::new();
        self.subscribers.lock().insert(id, tx);
        tracing::debug!(subscriber = %id, "log subscriber added");
        Subscription { id, rx }
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        if self.subscribers.lock().remove(&id).is_some() {
            tracing::debug!(subscriber = %id, "log subscriber removed");
        }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Deliver `event` to every live subscriber.
    ///
    /// Returns the number of successful deliveries. Subscribers whose
    /// send fails are gone before this call returns. With no subscribers
    /// this is a no-op.
    pub fn broadcast(&self, event: &LogEvent) -> usize {
        let mut subscribers = self.subscribers.lock();
        if subscribers.is_empty() {
            return 0;
        }

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, tx) in subscribers.iter() {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Closed(_)) => dead.push((*id, "closed")),
                Err(TrySendError::Full(_)) => dead.push((*id, "backlogged")),
            }
        }
        for (id, reason) in dead {
            subscribers.remove(&id);
            tracing::debug!(subscriber = %id, reason, "log subscriber dropped");
        }
        delivered
    }
}

/// Canned lines the synthetic feed rotates through.
const FEED_LINES: &[&str] = &[
    "core loop nominal, all adapters reporting",
    "metrics snapshot refreshed",
    "adapter health sweep complete",
    "guard policy active, no violations",
    "heartbeat check complete",
    "resource monitor pass complete",
];

/// Spawn the periodic synthetic log feed.
///
/// A stand-in for real event sources: anything able to call
/// [`LogBroadcaster::broadcast`] can replace it. The first line goes out
/// immediately, then one per `period`, until the returned handle is
/// aborted or the runtime shuts down.
pub fn spawn_feed(broadcaster: Arc<LogBroadcaster>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        let mut next = 0usize;
        loop {
            ticker.tick().await;
            let line = FEED_LINES[next % FEED_LINES.len()];
            next = next.wrapping_add(1);
            let delivered = broadcaster.broadcast(&LogEvent::now(line));
            tracing::trace!(
                delivered,
                subscribers = broadcaster.subscriber_count(),
                "synthetic feed tick"
            );
        }
    })
}
