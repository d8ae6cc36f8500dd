//! Token-secured event channel between the page script runtime and the
//! controller.
//!
//! Every inbound call carries the session token; mismatches are dropped
//! without effect. The bridge also repairs the tap protocol across full
//! page loads: a navigation destroys the page context before the in-flight
//! `TapBegin` can complete, so on load-finished the most recent unmatched
//! `TapBegin` is re-emitted as a `TapEnd`. Real `TapBegin` events are
//! recorded but filtered out of the subscriber stream.

use crate::protocol::InboundMessage;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

const TOKEN_LENGTH: usize = 24;
const CHANNEL_CAPACITY: usize = 64;

/// Session-scoped, token-checked message channel.
pub struct MessageBridge {
    token: String,
    tx: broadcast::Sender<InboundMessage>,
    pending_taps: Mutex<Vec<String>>,
    completed: AtomicBool,
}

impl MessageBridge {
    pub fn new() -> Self {
        let token: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            token,
            tx,
            pending_taps: Mutex::new(Vec::new()),
            completed: AtomicBool::new(false),
        }
    }

    /// The session token inbound calls must present.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Subscribe to the merged downstream event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<InboundMessage> {
        self.tx.subscribe()
    }

    /// Post an inbound message. Messages with a mismatched token or
    /// arriving after completion are dropped silently.
    pub fn post(&self, token: &str, message: InboundMessage) {
        if token != self.token {
            debug!("dropping message with bad token: {}", message.name());
            return;
        }
        if self.completed.load(Ordering::SeqCst) {
            debug!("dropping message after completion: {}", message.name());
            return;
        }
        match message {
            InboundMessage::TapBegin(action) => {
                // Recorded for load-synthesis, never forwarded downstream.
                self.pending_taps.lock().unwrap().push(action);
            }
            InboundMessage::TapEnd(action) => {
                self.settle_tap(&action);
                self.forward(InboundMessage::TapEnd(action));
            }
            other => self.forward(other),
        }
    }

    /// Notify the bridge that a full page load finished. If a tap is
    /// still in flight its end event is synthesized, since the page
    /// context that would have reported it no longer exists.
    pub fn page_loaded(&self) {
        let synthesized = self.pending_taps.lock().unwrap().pop();
        if let Some(action) = synthesized {
            debug!("synthesizing tap_end for '{}' after page load", action);
            if !self.completed.load(Ordering::SeqCst) {
                self.forward(InboundMessage::TapEnd(action));
            }
        }
    }

    /// Complete the stream: all further posts are dropped.
    pub fn complete(&self) {
        self.completed.store(true, Ordering::SeqCst);
    }

    fn settle_tap(&self, action: &str) {
        let mut pending = self.pending_taps.lock().unwrap();
        if let Some(pos) = pending.iter().rposition(|a| a == action) {
            pending.remove(pos);
        }
    }

    fn forward(&self, message: InboundMessage) {
        // Send errors only mean no subscriber is listening yet.
        let _ = self.tx.send(message);
    }
}

impl Default for MessageBridge {
    fn default() -> Self {
        Self::new()
    }
}
