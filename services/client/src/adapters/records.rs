//! services/client/src/adapters/records.rs
//!
//! JSON shapes exchanged with the REST backend and their conversions to and
//! from the core domain types. The backend speaks camelCase.

use chrono::{DateTime, Utc};
use educonnect_core::domain::{
    AccountDraft, ClassGroup, Message, Notification, Reaction, ReadStatus, Reply, ReplyDraft, Role,
    Sender, StudentProfile, User,
};
use educonnect_core::draft::ValidatedDraft;
use educonnect_core::ports::{PortError, PortResult};
use educonnect_core::reminder::{
    Audience, Frequency, ReminderPolicy, TimingRule, DEFAULT_CUSTOM_FREQUENCY_HOURS,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use tracing::warn;
use uuid::Uuid;

//=========================================================================================
// Envelopes
//=========================================================================================

/// List endpoints answer either with a bare array or with `{ "data": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum ListPayload<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListPayload<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            ListPayload::Bare(items) | ListPayload::Wrapped { data: items } => items,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(alias = "error")]
    pub message: Option<String>,
}

//=========================================================================================
// Auth
//=========================================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub remember_me: bool,
}

#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
    pub user: UserRecord,
}

/// The account shape used both on the wire and in cached credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    #[serde(alias = "full_name", default)]
    pub full_name: String,
    pub role: String,
}

impl UserRecord {
    pub fn from_domain(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role.as_str().to_string(),
        }
    }

    pub fn to_domain(self) -> PortResult<User> {
        let role = self.role.parse::<Role>().map_err(PortError::Unexpected)?;
        Ok(User {
            id: self.id,
            email: self.email,
            full_name: self.full_name,
            role,
        })
    }
}

//=========================================================================================
// Roster, profile and accounts
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClassRecord {
    id: Uuid,
    #[serde(alias = "className")]
    name: String,
    #[serde(default)]
    student_ids: Vec<Uuid>,
}

impl ClassRecord {
    pub(crate) fn to_domain(self) -> ClassGroup {
        ClassGroup {
            id: self.id,
            name: self.name,
            student_ids: self.student_ids,
        }
    }
}

/// `/student/profile` omits the role; it is always a student.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StudentProfileRecord {
    id: Uuid,
    email: String,
    #[serde(alias = "full_name", default)]
    full_name: String,
    #[serde(default)]
    class_name: Option<String>,
}

impl StudentProfileRecord {
    pub(crate) fn to_domain(self) -> StudentProfile {
        StudentProfile {
            id: self.id,
            email: self.email,
            full_name: self.full_name,
            class_name: self.class_name,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccountPayload<'a> {
    email: &'a str,
    full_name: &'a str,
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

impl<'a> AccountPayload<'a> {
    pub(crate) fn from_draft(account: &'a AccountDraft) -> Self {
        Self {
            email: &account.email,
            full_name: &account.full_name,
            role: account.role.as_str(),
            password: account.password.as_deref(),
        }
    }
}

//=========================================================================================
// Messages
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SenderRecord {
    id: Uuid,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum TimingRecord {
    AfterSend(u32),
    BeforeDeadline(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReminderRecord {
    enabled: bool,
    frequency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    custom_frequency_hours: Option<u32>,
    #[serde(default)]
    timing: Vec<TimingRecord>,
    #[serde(default)]
    target: Option<String>,
}

impl ReminderRecord {
    pub(crate) fn from_domain(policy: &ReminderPolicy) -> Self {
        let (frequency, custom_frequency_hours) = match policy.frequency {
            Frequency::Once => ("once", None),
            Frequency::Custom(hours) => ("custom", Some(hours.get())),
        };
        Self {
            enabled: policy.enabled,
            frequency: frequency.to_string(),
            custom_frequency_hours,
            timing: policy
                .timing
                .iter()
                .map(|rule| match rule {
                    TimingRule::AfterSend(h) => TimingRecord::AfterSend(h.get()),
                    TimingRule::BeforeDeadline(h) => TimingRecord::BeforeDeadline(h.get()),
                })
                .collect(),
            target: Some(policy.target.as_str().to_string()),
        }
    }

    /// Lenient: stored policies were validated when saved, so anything odd is
    /// normalised rather than rejected.
    fn to_domain(self) -> ReminderPolicy {
        let frequency = match self.frequency.as_str() {
            "custom" => self
                .custom_frequency_hours
                .and_then(NonZeroU32::new)
                .or(NonZeroU32::new(DEFAULT_CUSTOM_FREQUENCY_HOURS))
                .map_or(Frequency::Once, Frequency::Custom),
            _ => Frequency::Once,
        };
        let timing: Vec<TimingRule> = self
            .timing
            .into_iter()
            .filter_map(|rule| match rule {
                TimingRecord::AfterSend(h) => NonZeroU32::new(h).map(TimingRule::AfterSend),
                TimingRecord::BeforeDeadline(h) => {
                    NonZeroU32::new(h).map(TimingRule::BeforeDeadline)
                }
            })
            .collect();
        let target = match self.target.as_deref() {
            Some("read_no_reply") => Audience::ReadNoReply,
            _ => Audience::Unread,
        };
        if self.enabled && timing.is_empty() {
            return ReminderPolicy::disabled();
        }
        ReminderPolicy {
            enabled: self.enabled,
            frequency,
            timing,
            target,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadStatusRecord {
    recipient_id: Uuid,
    #[serde(default)]
    is_read: bool,
    #[serde(default)]
    read_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReactionRecord {
    recipient_id: Uuid,
    reaction: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReplyRecord {
    id: Uuid,
    recipient_id: Uuid,
    #[serde(default)]
    content: String,
    #[serde(default)]
    attachments: Vec<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl ReplyRecord {
    pub(crate) fn to_domain(self) -> Reply {
        Reply {
            id: self.id,
            recipient_id: self.recipient_id,
            content: self.content,
            attachments: self.attachments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessageRecord {
    id: Uuid,
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    attachments: Vec<String>,
    #[serde(default)]
    sender: Option<SenderRecord>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    lock_response_after_deadline: bool,
    #[serde(default)]
    reminder: Option<ReminderRecord>,
    #[serde(default, alias = "readStatus")]
    read_statuses: Vec<ReadStatusRecord>,
    #[serde(default)]
    reactions: Vec<ReactionRecord>,
    #[serde(default)]
    replies: Vec<ReplyRecord>,
}

impl MessageRecord {
    pub(crate) fn to_domain(self) -> Message {
        let message_id = self.id;
        Message {
            id: self.id,
            title: self.title,
            content: self.content,
            attachments: self.attachments,
            sender: self.sender.map(|s| Sender {
                id: s.id,
                full_name: s.full_name,
                email: s.email,
            }),
            created_at: self.created_at,
            deadline: self.deadline,
            lock_response_after_deadline: self.lock_response_after_deadline,
            reminder: self.reminder.map(ReminderRecord::to_domain),
            read_statuses: self
                .read_statuses
                .into_iter()
                .map(|r| ReadStatus {
                    recipient_id: r.recipient_id,
                    is_read: r.is_read,
                    read_at: r.read_at,
                })
                .collect(),
            reactions: self
                .reactions
                .into_iter()
                .filter_map(|r| match r.reaction.parse() {
                    Ok(kind) => Some(Reaction {
                        recipient_id: r.recipient_id,
                        kind,
                    }),
                    Err(e) => {
                        warn!(message_id = %message_id, error = %e, "dropping unknown reaction");
                        None
                    }
                })
                .collect(),
            replies: self.replies.into_iter().map(ReplyRecord::to_domain).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessagePayload<'a> {
    title: &'a str,
    content: &'a str,
    recipient_ids: &'a [Uuid],
    attachments: &'a [String],
    deadline: Option<DateTime<Utc>>,
    lock_response_after_deadline: bool,
    reminder: ReminderRecord,
}

impl<'a> MessagePayload<'a> {
    pub(crate) fn from_draft(draft: &'a ValidatedDraft) -> Self {
        Self {
            title: &draft.title,
            content: &draft.content,
            recipient_ids: &draft.recipient_ids,
            attachments: &draft.attachments,
            deadline: draft.deadline,
            lock_response_after_deadline: draft.lock_response_after_deadline,
            reminder: ReminderRecord::from_domain(&draft.reminder),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct ReplyPayload<'a> {
    content: &'a str,
    attachments: &'a [String],
}

impl<'a> ReplyPayload<'a> {
    pub(crate) fn from_draft(draft: &'a ReplyDraft) -> Self {
        Self {
            content: &draft.content,
            attachments: &draft.attachments,
        }
    }
}

//=========================================================================================
// Notifications and uploads
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NotificationRecord {
    id: Uuid,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    title: String,
    #[serde(default, alias = "message")]
    body: String,
    #[serde(default)]
    is_read: bool,
    #[serde(default)]
    message_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub(crate) fn to_domain(self) -> Option<Notification> {
        match self.kind.parse() {
            Ok(kind) => Some(Notification {
                id: self.id,
                kind,
                title: self.title,
                body: self.body,
                is_read: self.is_read,
                message_id: self.message_id,
                created_at: self.created_at,
            }),
            Err(e) => {
                warn!(notification_id = %self.id, error = %e, "dropping unknown notification");
                None
            }
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct UnreadCountResponse {
    #[serde(alias = "unreadCount")]
    pub count: u64,
}

#[derive(Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(alias = "fileUrl")]
    pub url: String,
}
