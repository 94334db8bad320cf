//! Out-of-band messages for the user interface.
//!
//! Recoverable failures (sanity-check errors, cache problems, duplicate
//! design units) are reported here rather than as source diagnostics. The
//! transports drain the queue and forward messages to the editor.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

/// Level of a UI message.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiLevel {
    /// Informational.
    Info,
    /// Something degraded but the request continued.
    Warning,
    /// Something failed.
    Error,
}

impl fmt::Display for UiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiLevel::Info => write!(f, "info"),
            UiLevel::Warning => write!(f, "warning"),
            UiLevel::Error => write!(f, "error"),
        }
    }
}

/// A queued message destined for the editor UI.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct UiMessage {
    /// Message level.
    pub level: UiLevel,
    /// Message text.
    pub text: String,
}

/// Thread-safe FIFO of UI messages.
///
/// Producers push from the build worker and request handlers; the
/// transport drains on demand.
#[derive(Default)]
pub struct UiQueue {
    messages: Mutex<VecDeque<UiMessage>>,
}

impl UiQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an info message.
    pub fn info(&self, text: impl Into<String>) {
        self.push(UiLevel::Info, text);
    }

    /// Queues a warning message.
    pub fn warning(&self, text: impl Into<String>) {
        self.push(UiLevel::Warning, text);
    }

    /// Queues an error message.
    pub fn error(&self, text: impl Into<String>) {
        self.push(UiLevel::Error, text);
    }

    fn push(&self, level: UiLevel, text: impl Into<String>) {
        let mut messages = self.messages.lock().unwrap();
        messages.push_back(UiMessage {
            level,
            text: text.into(),
        });
    }

    /// Takes all queued messages, oldest first.
    pub fn drain(&self) -> Vec<UiMessage> {
        let mut messages = self.messages.lock().unwrap();
        messages.drain(..).collect()
    }

    /// Whether any messages are queued.
    pub fn is_empty(&self) -> bool {
        self.messages.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_order() {
        let queue = UiQueue::new();
        queue.info("first");
        queue.error("second");
        queue.warning("third");

        let drained = queue.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0].text, "first");
        assert_eq!(drained[0].level, UiLevel::Info);
        assert_eq!(drained[1].level, UiLevel::Error);
        assert_eq!(drained[2].level, UiLevel::Warning);
    }

    #[test]
    fn drain_empties_queue() {
        let queue = UiQueue::new();
        queue.info("x");
        assert!(!queue.is_empty());
        queue.drain();
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn concurrent_pushes() {
        use std::sync::Arc;
        use std::thread;

        let queue = Arc::new(UiQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for _ in 0..50 {
                        queue.info(format!("msg from {i}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(queue.drain().len(), 400);
    }
}
