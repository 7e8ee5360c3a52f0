//! Transient user-facing notifications.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(6);
const MAX_PENDING: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    pub expires: Instant,
}

/// Bounded queue; the oldest entry is dropped when full.
#[derive(Debug)]
pub struct Notifications {
    queue: VecDeque<Notification>,
    ttl: Duration,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            ttl,
        }
    }

    pub fn info(&mut self, message: impl Into<String>, now: Instant) {
        let message = message.into();
        tracing::info!("{message}");
        self.push(Level::Info, message, now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) {
        let message = message.into();
        tracing::error!("{message}");
        self.push(Level::Error, message, now);
    }

    fn push(&mut self, level: Level, message: String, now: Instant) {
        if self.queue.len() == MAX_PENDING {
            self.queue.pop_front();
        }
        self.queue.push_back(Notification {
            level,
            message,
            expires: now + self.ttl,
        });
    }

    /// Drop notifications that have expired at `now`.
    pub fn expire(&mut self, now: Instant) {
        self.queue.retain(|n| n.expires > now);
    }

    /// The newest live notification.
    pub fn latest(&self) -> Option<&Notification> {
        self.queue.back()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
