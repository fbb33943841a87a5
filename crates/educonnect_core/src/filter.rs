//! crates/educonnect_core/src/filter.rs
//!
//! Derives the visible subset of a message list from user-chosen criteria.
//!
//! Every clause is a pure predicate over one message; `apply` keeps a message
//! only when all of them hold and never reorders the input. Re-ordering is a
//! separate, explicit step (`sort`).

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use uuid::Uuid;

use crate::domain::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyStatus {
    #[default]
    All,
    Replied,
    NotReplied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFilter {
    #[default]
    All,
    Read,
    Unread,
}

/// Inclusive calendar-day bounds. Either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search_text: Option<String>,
    pub reply_status: ReplyStatus,
    pub read_status: ReadFilter,
    pub sent_range: DateRange,
    pub deadline_range: DateRange,
    /// Offset used to turn instants into calendar days for the range clauses.
    pub utc_offset: FixedOffset,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search_text: None,
            reply_status: ReplyStatus::All,
            read_status: ReadFilter::All,
            sent_range: DateRange::default(),
            deadline_range: DateRange::default(),
            utc_offset: Utc.fix(),
        }
    }
}

impl FilterCriteria {
    /// Whether `message` satisfies every clause for `viewer`.
    pub fn matches(&self, message: &Message, viewer: Uuid) -> bool {
        self.matches_search(message)
            && self.matches_reply_status(message, viewer)
            && self.matches_read_status(message, viewer)
            && self.matches_sent_range(message)
            && self.matches_deadline_range(message)
    }

    fn matches_search(&self, message: &Message) -> bool {
        let needle = match self.search_text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_lowercase(),
            _ => return true,
        };
        let hit = |haystack: &str| haystack.to_lowercase().contains(&needle);

        hit(&message.title)
            || message.sender.as_ref().is_some_and(|sender| {
                sender.full_name.as_deref().is_some_and(hit)
                    || sender.email.as_deref().is_some_and(hit)
            })
    }

    fn matches_reply_status(&self, message: &Message, viewer: Uuid) -> bool {
        match self.reply_status {
            ReplyStatus::All => true,
            ReplyStatus::Replied => has_responded(message, viewer),
            ReplyStatus::NotReplied => !has_responded(message, viewer),
        }
    }

    fn matches_read_status(&self, message: &Message, viewer: Uuid) -> bool {
        match self.read_status {
            ReadFilter::All => true,
            ReadFilter::Read => is_read_by(message, viewer),
            ReadFilter::Unread => !is_read_by(message, viewer),
        }
    }

    fn matches_sent_range(&self, message: &Message) -> bool {
        self.sent_range.is_unbounded()
            || self.sent_range.contains(self.day_of(message.created_at))
    }

    fn matches_deadline_range(&self, message: &Message) -> bool {
        if self.deadline_range.is_unbounded() {
            return true;
        }
        message
            .deadline
            .is_some_and(|deadline| self.deadline_range.contains(self.day_of(deadline)))
    }

    fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.utc_offset).date_naive()
    }
}

/// Whether `viewer` has answered `message`, by reply or by reaction.
pub fn has_responded(message: &Message, viewer: Uuid) -> bool {
    message.replies.iter().any(|r| r.recipient_id == viewer)
        || message.reactions.iter().any(|r| r.recipient_id == viewer)
}

pub fn is_read_by(message: &Message, viewer: Uuid) -> bool {
    message
        .read_statuses
        .iter()
        .any(|status| status.recipient_id == viewer && status.is_read)
}

/// Stable filter: retained messages keep their input order.
pub fn apply<'a>(
    messages: &'a [Message],
    criteria: &FilterCriteria,
    viewer: Uuid,
) -> Vec<&'a Message> {
    messages
        .iter()
        .filter(|message| criteria.matches(message, viewer))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    /// Messages with the nearest deadline first; messages without one go last.
    DeadlineSoonest,
}

/// Stable sort of an already filtered view.
pub fn sort(messages: &mut [&Message], order: SortOrder) {
    match order {
        SortOrder::NewestFirst => messages.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::OldestFirst => messages.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOrder::DeadlineSoonest => messages.sort_by(|a, b| match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }),
    }
}
