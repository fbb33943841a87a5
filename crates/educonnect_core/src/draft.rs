//! crates/educonnect_core/src/draft.rs
//!
//! Submission gates for message and reply forms.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{MessageDraft, ReplyDraft};
use crate::reminder::{self, ReminderPolicy, ValidationError};

/// A message draft that passed every client-side check and is ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDraft {
    pub title: String,
    pub content: String,
    pub recipient_ids: Vec<Uuid>,
    pub attachments: Vec<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub lock_response_after_deadline: bool,
    pub reminder: ReminderPolicy,
}

impl MessageDraft {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<ValidatedDraft, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        if self.recipient_ids.is_empty() {
            return Err(ValidationError::MissingField("recipients"));
        }

        let reminder = reminder::build(&self.reminder, self.deadline, now)?;

        let mut recipient_ids = Vec::with_capacity(self.recipient_ids.len());
        for id in &self.recipient_ids {
            if !recipient_ids.contains(id) {
                recipient_ids.push(*id);
            }
        }

        Ok(ValidatedDraft {
            title: title.to_string(),
            content: self.content.clone(),
            recipient_ids,
            attachments: self.attachments.clone(),
            deadline: self.deadline,
            // Locking only means something when there is a deadline to lock at.
            lock_response_after_deadline: self.deadline.is_some()
                && self.lock_response_after_deadline,
            reminder,
        })
    }
}

impl ReplyDraft {
    pub fn validate(&self) -> Result<ReplyDraft, ValidationError> {
        let content = self.content.trim();
        if content.is_empty() && self.attachments.is_empty() {
            return Err(ValidationError::MissingField("content"));
        }
        Ok(ReplyDraft {
            content: content.to_string(),
            attachments: self.attachments.clone(),
        })
    }
}
