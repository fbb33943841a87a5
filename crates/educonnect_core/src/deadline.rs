//! crates/educonnect_core/src/deadline.rs
//!
//! Decides whether a message's response window is still open.

use chrono::{DateTime, Duration, Utc};

use crate::domain::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseWindow {
    Open,
    /// Past the deadline, but replies and reactions are still accepted.
    Expired,
    /// Past the deadline and the sender locked responses.
    ExpiredLocked,
}

impl ResponseWindow {
    /// Whether reply, edit and reaction actions should be offered.
    pub fn accepts_responses(&self) -> bool {
        !matches!(self, ResponseWindow::ExpiredLocked)
    }

    pub fn is_expired(&self) -> bool {
        !matches!(self, ResponseWindow::Open)
    }
}

/// Field-level evaluation, usable before a full `Message` exists.
pub fn evaluate(
    deadline: Option<DateTime<Utc>>,
    lock_response_after_deadline: bool,
    now: DateTime<Utc>,
) -> ResponseWindow {
    match deadline {
        Some(deadline) if now >= deadline => {
            if lock_response_after_deadline {
                ResponseWindow::ExpiredLocked
            } else {
                ResponseWindow::Expired
            }
        }
        _ => ResponseWindow::Open,
    }
}

pub fn status(message: &Message, now: DateTime<Utc>) -> ResponseWindow {
    evaluate(message.deadline, message.lock_response_after_deadline, now)
}

/// Time left before the deadline, or `None` when there is no deadline or it has passed.
pub fn time_remaining(message: &Message, now: DateTime<Utc>) -> Option<Duration> {
    message
        .deadline
        .filter(|deadline| *deadline > now)
        .map(|deadline| deadline - now)
}
