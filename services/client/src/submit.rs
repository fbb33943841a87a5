//! services/client/src/submit.rs
//!
//! Single-flight protection for user-triggered submissions.
//!
//! The guard is keyed on the action and the message it targets: a reply to
//! one message in flight does not block a reaction on another.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::ClientError;

/// The kinds of submission a user can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmitAction {
    SendMessage,
    UpdateMessage,
    DeleteMessage,
    Reply,
    EditReply,
    /// Setting and clearing a reaction share one slot per message.
    React,
}

/// Identifies one submission slot. `message_id` is `None` for actions that
/// do not target an existing message, such as sending a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmitKey {
    pub action: SubmitAction,
    pub message_id: Option<Uuid>,
}

impl SubmitKey {
    pub fn new(action: SubmitAction) -> Self {
        Self {
            action,
            message_id: None,
        }
    }

    pub fn on(action: SubmitAction, message_id: Uuid) -> Self {
        Self {
            action,
            message_id: Some(message_id),
        }
    }
}

/// Rejects a second submission with the same key while one is in flight.
#[derive(Debug, Default)]
pub struct SubmitGuard {
    in_flight: Mutex<HashSet<SubmitKey>>,
}

/// Held for the duration of one submission. Releases its key on drop,
/// including when the submitting future is cancelled.
#[derive(Debug)]
pub struct SubmitPermit<'a> {
    guard: &'a SubmitGuard,
    key: SubmitKey,
}

impl Drop for SubmitPermit<'_> {
    fn drop(&mut self) {
        let mut in_flight = match self.guard.in_flight.lock() {
            Ok(in_flight) => in_flight,
            Err(poisoned) => poisoned.into_inner(),
        };
        in_flight.remove(&self.key);
    }
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self, key: SubmitKey) -> bool {
        self.in_flight
            .lock()
            .map(|in_flight| in_flight.contains(&key))
            .unwrap_or(true)
    }

    pub fn try_acquire(&self, key: SubmitKey) -> Result<SubmitPermit<'_>, ClientError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| ClientError::Internal("submit guard lock poisoned".into()))?;
        if !in_flight.insert(key) {
            return Err(ClientError::Busy);
        }
        Ok(SubmitPermit { guard: self, key })
    }

    /// Runs `action` while holding the slot for `key`.
    pub async fn run<T, F, Fut>(&self, key: SubmitKey, action: F) -> Result<T, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let _permit = self.try_acquire(key)?;
        action().await
    }
}
