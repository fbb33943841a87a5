//! crates/educonnect_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client logic depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to stay independent of the REST backend, the transport and local storage.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::domain::{
    AccountDraft, AuthGrant, ClassGroup, Message, Notification, ReactionKind, Reply, ReplyDraft,
    StudentProfile, User,
};
use crate::draft::ValidatedDraft;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (HTTP, storage).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// The request never produced a response (timeout, connection failure).
    #[error("Network error: {0}")]
    Network(String),
    /// The server answered with a non-success status and a message.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PortError::Network(_))
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, email: &str, password: &str, remember_me: bool) -> PortResult<AuthGrant>;

    async fn forgot_password(&self, email: &str) -> PortResult<()>;

    async fn reset_password(&self, email: &str, otp: &str, new_password: &str) -> PortResult<()>;

    async fn change_password(&self, old_password: &str, new_password: &str) -> PortResult<()>;
}

#[async_trait]
pub trait MessageService: Send + Sync {
    // --- Sender side ---
    async fn list_sent(&self) -> PortResult<Vec<Message>>;

    async fn create_message(&self, draft: &ValidatedDraft) -> PortResult<Message>;

    /// Replaces the message content, deadline and reminder policy wholesale.
    async fn update_message(
        &self,
        message_id: Uuid,
        draft: &ValidatedDraft,
    ) -> PortResult<Message>;

    async fn delete_message(&self, message_id: Uuid) -> PortResult<()>;

    // --- Recipient side ---
    async fn list_received(&self) -> PortResult<Vec<Message>>;

    async fn get_received(&self, message_id: Uuid) -> PortResult<Message>;

    async fn mark_message_read(&self, message_id: Uuid) -> PortResult<()>;

    async fn submit_reply(&self, message_id: Uuid, reply: &ReplyDraft) -> PortResult<Reply>;

    async fn edit_reply(
        &self,
        message_id: Uuid,
        reply_id: Uuid,
        reply: &ReplyDraft,
    ) -> PortResult<Reply>;

    async fn set_reaction(&self, message_id: Uuid, kind: ReactionKind) -> PortResult<()>;

    async fn clear_reaction(&self, message_id: Uuid) -> PortResult<()>;
}

/// Class membership, as visible to a teacher.
#[async_trait]
pub trait RosterService: Send + Sync {
    async fn list_classes(&self) -> PortResult<Vec<ClassGroup>>;

    /// Students taught by the caller, optionally narrowed to one class.
    async fn list_students(&self, class_id: Option<Uuid>) -> PortResult<Vec<User>>;
}

#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn student_profile(&self) -> PortResult<StudentProfile>;
}

/// Account management, admin only.
#[async_trait]
pub trait AccountService: Send + Sync {
    async fn list_users(&self) -> PortResult<Vec<User>>;

    async fn create_user(&self, account: &AccountDraft) -> PortResult<User>;

    async fn update_user(&self, user_id: Uuid, account: &AccountDraft) -> PortResult<User>;

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()>;
}

/// Where notification snapshots come from. Polling today; a push transport
/// can implement the same contract.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn unread_count(&self) -> PortResult<u64>;

    async fn list(&self) -> PortResult<Vec<Notification>>;

    async fn mark_read(&self, notification_id: Uuid) -> PortResult<()>;

    async fn mark_all_read(&self) -> PortResult<()>;

    async fn delete(&self, notification_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait UploadService: Send + Sync {
    /// Uploads one file and returns the opaque URI to reference as an attachment.
    async fn upload(&self, file_name: &str, data: Bytes) -> PortResult<String>;
}

/// A string key/value store such as browser session or local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> PortResult<()>;

    fn remove(&self, key: &str) -> PortResult<()>;
}
