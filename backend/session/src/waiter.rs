//! Per-context waiter registry: routes follow-up messages to the one
//! session waiting on their conversation.

use std::collections::HashMap;

use imagetrace_core::{ContextKey, MessageEvent};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Buffered follow-ups per waiter; anything beyond this is dropped back to
/// normal handling.
const FOLLOW_UP_BUFFER: usize = 8;

/// Registry of contexts currently awaiting a follow-up image.
///
/// Registration is an atomic check-and-insert, so at most one waiter ever
/// exists per context and two sessions can never double-consume the same
/// follow-up. Sessions must unregister on every exit path; a completed or
/// timed-out session no longer receives events.
pub struct WaiterRegistry {
    waiters: Mutex<HashMap<ContextKey, mpsc::Sender<MessageEvent>>>,
}

impl WaiterRegistry {
    pub fn new() -> Self {
        Self {
            waiters: Mutex::new(HashMap::new()),
        }
    }

    /// Claim the waiter slot for `context`.
    ///
    /// Returns the receiving end of the follow-up channel, or `None` when a
    /// session is already waiting on this context.
    pub async fn register(&self, context: &ContextKey) -> Option<mpsc::Receiver<MessageEvent>> {
        let mut waiters = self.waiters.lock().await;
        if waiters.contains_key(context) {
            return None;
        }
        let (tx, rx) = mpsc::channel(FOLLOW_UP_BUFFER);
        waiters.insert(context.clone(), tx);
        debug!("[Waiter] registered waiter for {context}");
        Some(rx)
    }

    /// Release the waiter slot for `context`.
    pub async fn unregister(&self, context: &ContextKey) {
        if self.waiters.lock().await.remove(context).is_some() {
            debug!("[Waiter] unregistered waiter for {context}");
        }
    }

    /// Offer an inbound event to the waiter on its context, if any.
    /// Returns true when a waiter consumed it.
    pub async fn offer(&self, event: &MessageEvent) -> bool {
        let waiters = self.waiters.lock().await;
        match waiters.get(&event.context) {
            Some(tx) => tx.try_send(event.clone()).is_ok(),
            None => false,
        }
    }

    pub async fn is_waiting(&self, context: &ContextKey) -> bool {
        self.waiters.lock().await.contains_key(context)
    }
}

impl Default for WaiterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
