//! services/client/src/messaging.rs
//!
//! Sender and recipient workflows over the message ports.
//!
//! Every submission passes the client-side gates first (`MessageDraft::validate`,
//! `ReplyDraft::validate`, the deadline response window) so an invalid action
//! never produces a request.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use educonnect_core::deadline;
use educonnect_core::domain::{Message, MessageDraft, ReactionKind, Reply, ReplyDraft};
use educonnect_core::filter::{self, FilterCriteria, SortOrder};
use educonnect_core::ports::{MessageService, PortError, RosterService, UploadService};
use educonnect_core::reminder::ValidationError;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ClientError;
use crate::submit::{SubmitAction, SubmitGuard, SubmitKey};

//=========================================================================================
// Sender side
//=========================================================================================

pub struct Composer {
    messages: Arc<dyn MessageService>,
    uploads: Arc<dyn UploadService>,
    guard: SubmitGuard,
}

impl Composer {
    pub fn new(messages: Arc<dyn MessageService>, uploads: Arc<dyn UploadService>) -> Self {
        Self {
            messages,
            uploads,
            guard: SubmitGuard::new(),
        }
    }

    /// Uploads a file and returns the URI to add to `MessageDraft::attachments`.
    pub async fn attach(&self, file_name: &str, data: Bytes) -> Result<String, ClientError> {
        if file_name.trim().is_empty() {
            return Err(ValidationError::MissingField("file name").into());
        }
        Ok(self.uploads.upload(file_name, data).await?)
    }

    pub async fn send(
        &self,
        draft: &MessageDraft,
        now: DateTime<Utc>,
    ) -> Result<Message, ClientError> {
        let validated = draft.validate(now)?;
        let message = self
            .guard
            .run(SubmitKey::new(SubmitAction::SendMessage), || async {
                Ok(self.messages.create_message(&validated).await?)
            })
            .await?;
        info!(
            message_id = %message.id,
            recipients = validated.recipient_ids.len(),
            reminder = validated.reminder.enabled,
            "message sent"
        );
        Ok(message)
    }

    /// Saves an edited message. The reminder policy is replaced, never merged.
    pub async fn update(
        &self,
        message_id: Uuid,
        draft: &MessageDraft,
        now: DateTime<Utc>,
    ) -> Result<Message, ClientError> {
        let validated = draft.validate(now)?;
        let key = SubmitKey::on(SubmitAction::UpdateMessage, message_id);
        self.guard
            .run(key, || async {
                Ok(self.messages.update_message(message_id, &validated).await?)
            })
            .await
    }

    pub async fn delete(&self, message_id: Uuid) -> Result<(), ClientError> {
        let key = SubmitKey::on(SubmitAction::DeleteMessage, message_id);
        self.guard
            .run(key, || async { Ok(self.messages.delete_message(message_id).await?) })
            .await
    }

    pub async fn sent(&self) -> Result<Vec<Message>, ClientError> {
        Ok(self.messages.list_sent().await?)
    }
}

/// Expands class ids into the distinct students they contain, in class order.
/// A class the roster omits member ids for is asked for its students directly.
pub async fn class_recipients(
    roster: &dyn RosterService,
    class_ids: &[Uuid],
) -> Result<Vec<Uuid>, ClientError> {
    if class_ids.is_empty() {
        return Ok(Vec::new());
    }
    let classes = roster.list_classes().await?;
    let mut recipients = Vec::new();
    for class_id in class_ids {
        let class = classes
            .iter()
            .find(|c| c.id == *class_id)
            .ok_or_else(|| PortError::NotFound(format!("class {class_id}")))?;
        let members = if class.student_ids.is_empty() {
            roster
                .list_students(Some(class.id))
                .await?
                .into_iter()
                .map(|student| student.id)
                .collect()
        } else {
            class.student_ids.clone()
        };
        for id in members {
            if !recipients.contains(&id) {
                recipients.push(id);
            }
        }
    }
    Ok(recipients)
}

//=========================================================================================
// Recipient side
//=========================================================================================

pub struct Inbox {
    messages: Arc<dyn MessageService>,
    viewer: Uuid,
    guard: SubmitGuard,
}

fn ensure_accepts_responses(
    message: &Message,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if deadline::status(message, now).accepts_responses() {
        Ok(())
    } else {
        Err(ValidationError::ResponsesLocked)
    }
}

impl Inbox {
    pub fn new(messages: Arc<dyn MessageService>, viewer: Uuid) -> Self {
        Self {
            messages,
            viewer,
            guard: SubmitGuard::new(),
        }
    }

    pub fn viewer(&self) -> Uuid {
        self.viewer
    }

    /// Received messages matching `criteria`, in `order`.
    pub async fn list(
        &self,
        criteria: &FilterCriteria,
        order: SortOrder,
    ) -> Result<Vec<Message>, ClientError> {
        let received = self.messages.list_received().await?;
        let mut matching = filter::apply(&received, criteria, self.viewer);
        filter::sort(&mut matching, order);
        Ok(matching.into_iter().cloned().collect())
    }

    /// Loads one message and records that the viewer has read it.
    /// A failed read receipt is logged; the message is still returned.
    pub async fn open(&self, message_id: Uuid) -> Result<Message, ClientError> {
        let message = self.messages.get_received(message_id).await?;
        if !filter::is_read_by(&message, self.viewer) {
            if let Err(error) = self.messages.mark_message_read(message_id).await {
                warn!(message_id = %message_id, error = %error, "failed to mark message read");
            }
        }
        Ok(message)
    }

    pub async fn reply(
        &self,
        message: &Message,
        draft: &ReplyDraft,
        now: DateTime<Utc>,
    ) -> Result<Reply, ClientError> {
        ensure_accepts_responses(message, now)?;
        let reply = draft.validate()?;
        self.guard
            .run(SubmitKey::on(SubmitAction::Reply, message.id), || async {
                Ok(self.messages.submit_reply(message.id, &reply).await?)
            })
            .await
    }

    /// Edits one of the viewer's own replies.
    pub async fn edit_reply(
        &self,
        message: &Message,
        reply_id: Uuid,
        draft: &ReplyDraft,
        now: DateTime<Utc>,
    ) -> Result<Reply, ClientError> {
        ensure_accepts_responses(message, now)?;
        let owned = message
            .replies
            .iter()
            .any(|r| r.id == reply_id && r.recipient_id == self.viewer);
        if !owned {
            return Err(PortError::NotFound(format!("reply {reply_id}")).into());
        }
        let reply = draft.validate()?;
        self.guard
            .run(SubmitKey::on(SubmitAction::EditReply, message.id), || async {
                Ok(self.messages.edit_reply(message.id, reply_id, &reply).await?)
            })
            .await
    }

    /// Sets the viewer's single reaction, replacing any previous one.
    pub async fn react(
        &self,
        message: &Message,
        kind: ReactionKind,
        now: DateTime<Utc>,
    ) -> Result<(), ClientError> {
        ensure_accepts_responses(message, now)?;
        self.guard
            .run(SubmitKey::on(SubmitAction::React, message.id), || async {
                Ok(self.messages.set_reaction(message.id, kind).await?)
            })
            .await
    }

    pub async fn clear_reaction(
        &self,
        message: &Message,
        now: DateTime<Utc>,
    ) -> Result<(), ClientError> {
        ensure_accepts_responses(message, now)?;
        self.guard
            .run(SubmitKey::on(SubmitAction::React, message.id), || async {
                Ok(self.messages.clear_reaction(message.id).await?)
            })
            .await
    }
}
