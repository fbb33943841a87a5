//! crates/educonnect_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any wire or storage format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::reminder::{ReminderForm, ReminderPolicy};

/// The three account kinds the school system knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

// Represents a signed-in account - used throughout the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

/// The author of a message as embedded in message listings.
/// Older records may lack a name or email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// A directed communication from one sender to many recipients.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// Opaque attachment URIs returned by the upload endpoint.
    pub attachments: Vec<String>,
    pub sender: Option<Sender>,
    pub created_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub lock_response_after_deadline: bool,
    pub reminder: Option<ReminderPolicy>,
    pub read_statuses: Vec<ReadStatus>,
    pub reactions: Vec<Reaction>,
    pub replies: Vec<Reply>,
}

/// Per-(message, recipient) read flag. Only ever moves from unread to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadStatus {
    pub recipient_id: Uuid,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
}

/// The closed set of reaction tags a recipient may attach to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionKind {
    Like,
    Thanks,
    Understood,
    Star,
    Question,
    Idea,
    Great,
    Done,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 8] = [
        ReactionKind::Like,
        ReactionKind::Thanks,
        ReactionKind::Understood,
        ReactionKind::Star,
        ReactionKind::Question,
        ReactionKind::Idea,
        ReactionKind::Great,
        ReactionKind::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Thanks => "thanks",
            ReactionKind::Understood => "understood",
            ReactionKind::Star => "star",
            ReactionKind::Question => "question",
            ReactionKind::Idea => "idea",
            ReactionKind::Great => "great",
            ReactionKind::Done => "done",
        }
    }
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReactionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown reaction '{s}'"))
    }
}

/// At most one reaction exists per (message, recipient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub recipient_id: Uuid,
    pub kind: ReactionKind,
}

/// A free-text response by a recipient. A recipient may send several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    NewMessage,
    MessageReply,
    MessageReaction,
    ManualReminder,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewMessage => "new_message",
            NotificationKind::MessageReply => "message_reply",
            NotificationKind::MessageReaction => "message_reaction",
            NotificationKind::ManualReminder => "manual_reminder",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_message" => Ok(NotificationKind::NewMessage),
            "message_reply" => Ok(NotificationKind::MessageReply),
            "message_reaction" => Ok(NotificationKind::MessageReaction),
            "manual_reminder" => Ok(NotificationKind::ManualReminder),
            other => Err(format!("unknown notification type '{other}'")),
        }
    }
}

/// A server-generated event record. The client only marks it read or deletes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub message_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// The token and account returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: String,
    pub user: User,
}

/// A class as seen by its teacher. Membership is the recipient source for messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassGroup {
    pub id: Uuid,
    pub name: String,
    pub student_ids: Vec<Uuid>,
}

/// The signed-in student's own record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub class_name: Option<String>,
}

/// Admin form state for creating or editing an account.
/// `password` is only sent when set; the backend keeps the old one otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDraft {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub password: Option<String>,
}

/// Form state for composing or editing a message, before validation.
#[derive(Debug, Clone, Default)]
pub struct MessageDraft {
    pub title: String,
    pub content: String,
    pub recipient_ids: Vec<Uuid>,
    pub attachments: Vec<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub lock_response_after_deadline: bool,
    pub reminder: ReminderForm,
}

/// Reply form state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyDraft {
    pub content: String,
    pub attachments: Vec<String>,
}
