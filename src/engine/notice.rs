//! Transient user feedback.
//!
//! Notices carry their own expiry; views simply stop showing them once
//! the time-to-live has passed. Notices without a ttl stay until
//! dismissed.

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

use crate::types::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    /// "You bet yes/no" indicator after a commit swipe.
    Swipe,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    shown_at: Instant,
    ttl: Option<Duration>,
}

/// Renderable part of a notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeView {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>, ttl: Option<Duration>) -> Self {
        Self {
            kind,
            message: message.into(),
            shown_at: Instant::now(),
            ttl,
        }
    }

    pub fn success(ttl: Duration) -> Self {
        Self::new(NoticeKind::Success, "Bet placed successfully!", Some(ttl))
    }

    /// Errors stay until dismissed or replaced.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, message, None)
    }

    pub fn swipe(side: Side, ttl: Duration) -> Self {
        Self::new(NoticeKind::Swipe, format!("You bet {}", side.label()), Some(ttl))
    }

    pub fn is_active_at(&self, now: Instant) -> bool {
        self.ttl.map_or(true, |ttl| now < self.shown_at + ttl)
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Instant::now())
    }

    pub fn view(&self) -> NoticeView {
        NoticeView {
            kind: self.kind,
            message: self.message.clone(),
        }
    }
}
