//! crates/educonnect_core/src/reminder.rs
//!
//! Turns reminder form state into a validated `ReminderPolicy`.
//!
//! The policy is owned by exactly one message and is replaced wholesale on
//! every save, so the builder never merges with a previous value.

use chrono::{DateTime, Utc};
use std::num::NonZeroU32;

/// Interval used when the user picks a custom frequency without a value.
pub const DEFAULT_CUSTOM_FREQUENCY_HOURS: u32 = 24;

/// Client-detected problems that block a submission.
/// These are shown inline and never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Select at least one reminder timing")]
    NoTimingSelected,
    #[error("A reminder before the deadline requires a deadline")]
    MissingDeadlineForBeforeDeadlineRule,
    #[error("The deadline must be in the future")]
    DeadlineInPast,
    #[error("{field} must be a positive number of hours")]
    NonPositiveHours { field: &'static str },
    #[error("The {0} field is required")]
    MissingField(&'static str),
    #[error("Responses to this message are locked after its deadline")]
    ResponsesLocked,
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Who receives the automated follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Audience {
    #[default]
    Unread,
    ReadNoReply,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Unread => "unread",
            Audience::ReadNoReply => "read_no_reply",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencyChoice {
    #[default]
    Once,
    Custom,
}

/// One checkbox/value pair from the timing section of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingSelection {
    AfterSendHours(u32),
    BeforeDeadlineHours(u32),
}

/// Raw reminder form state as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderForm {
    pub enabled: bool,
    pub timing: Vec<TimingSelection>,
    pub frequency: FrequencyChoice,
    pub custom_frequency_hours: Option<u32>,
    pub target: Option<Audience>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Once,
    Custom(NonZeroU32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingRule {
    AfterSend(NonZeroU32),
    BeforeDeadline(NonZeroU32),
}

impl TimingRule {
    pub fn hours(&self) -> u32 {
        match self {
            TimingRule::AfterSend(h) | TimingRule::BeforeDeadline(h) => h.get(),
        }
    }
}

/// A validated reminder configuration.
///
/// When `enabled` is true `timing` is non-empty, and a `BeforeDeadline` rule
/// only exists when the owning message has a deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderPolicy {
    pub enabled: bool,
    pub frequency: Frequency,
    pub timing: Vec<TimingRule>,
    pub target: Audience,
}

impl ReminderPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            frequency: Frequency::Once,
            timing: Vec::new(),
            target: Audience::Unread,
        }
    }

    pub fn has_before_deadline_rule(&self) -> bool {
        self.timing
            .iter()
            .any(|rule| matches!(rule, TimingRule::BeforeDeadline(_)))
    }
}

/// Validates `form` against the message `deadline` as of `now`.
pub fn build(
    form: &ReminderForm,
    deadline: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<ReminderPolicy, ValidationError> {
    if let Some(deadline) = deadline {
        if deadline <= now {
            return Err(ValidationError::DeadlineInPast);
        }
    }

    let wants_before_deadline = form
        .timing
        .iter()
        .any(|sel| matches!(sel, TimingSelection::BeforeDeadlineHours(_)));
    if wants_before_deadline && deadline.is_none() {
        return Err(ValidationError::MissingDeadlineForBeforeDeadlineRule);
    }

    if !form.enabled {
        return Ok(ReminderPolicy::disabled());
    }

    if form.timing.is_empty() {
        return Err(ValidationError::NoTimingSelected);
    }

    let mut timing: Vec<TimingRule> = Vec::with_capacity(form.timing.len());
    for selection in &form.timing {
        let rule = match *selection {
            TimingSelection::AfterSendHours(h) => {
                TimingRule::AfterSend(positive_hours(h, "afterSendHours")?)
            }
            TimingSelection::BeforeDeadlineHours(h) => {
                TimingRule::BeforeDeadline(positive_hours(h, "beforeDeadlineHours")?)
            }
        };
        if !timing.contains(&rule) {
            timing.push(rule);
        }
    }

    let frequency = match form.frequency {
        FrequencyChoice::Once => Frequency::Once,
        FrequencyChoice::Custom => {
            let hours = form
                .custom_frequency_hours
                .unwrap_or(DEFAULT_CUSTOM_FREQUENCY_HOURS);
            Frequency::Custom(positive_hours(hours, "customFrequencyHours")?)
        }
    };

    Ok(ReminderPolicy {
        enabled: true,
        frequency,
        timing,
        target: form.target.unwrap_or_default(),
    })
}

fn positive_hours(hours: u32, field: &'static str) -> Result<NonZeroU32, ValidationError> {
    NonZeroU32::new(hours).ok_or(ValidationError::NonPositiveHours { field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 8, 0, 0).unwrap()
    }

    fn enabled_form(timing: Vec<TimingSelection>) -> ReminderForm {
        ReminderForm {
            enabled: true,
            timing,
            ..ReminderForm::default()
        }
    }

    #[test]
    fn disabled_form_yields_disabled_policy() {
        let policy = build(&ReminderForm::default(), None, now()).unwrap();
        assert_eq!(policy, ReminderPolicy::disabled());
    }

    #[test]
    fn enabled_without_timing_is_rejected() {
        let form = ReminderForm {
            enabled: true,
            frequency: FrequencyChoice::Custom,
            custom_frequency_hours: Some(6),
            target: Some(Audience::ReadNoReply),
            ..ReminderForm::default()
        };
        let deadline = Some(now() + Duration::days(1));
        assert_eq!(build(&form, deadline, now()), Err(ValidationError::NoTimingSelected));
    }

    #[test]
    fn before_deadline_rule_needs_a_deadline_even_when_disabled() {
        let mut form = enabled_form(vec![TimingSelection::BeforeDeadlineHours(12)]);
        assert_eq!(
            build(&form, None, now()),
            Err(ValidationError::MissingDeadlineForBeforeDeadlineRule)
        );
        form.enabled = false;
        assert_eq!(
            build(&form, None, now()),
            Err(ValidationError::MissingDeadlineForBeforeDeadlineRule)
        );
    }

    #[test]
    fn deadline_must_be_strictly_after_now() {
        let form = enabled_form(vec![TimingSelection::AfterSendHours(2)]);
        assert_eq!(build(&form, Some(now()), now()), Err(ValidationError::DeadlineInPast));
        assert_eq!(
            build(&form, Some(now() - Duration::minutes(1)), now()),
            Err(ValidationError::DeadlineInPast)
        );
        assert!(build(&form, Some(now() + Duration::seconds(1)), now()).is_ok());
    }

    #[test]
    fn zero_hours_are_rejected() {
        let form = enabled_form(vec![TimingSelection::AfterSendHours(0)]);
        assert_eq!(
            build(&form, None, now()),
            Err(ValidationError::NonPositiveHours { field: "afterSendHours" })
        );

        let form = ReminderForm {
            frequency: FrequencyChoice::Custom,
            custom_frequency_hours: Some(0),
            ..enabled_form(vec![TimingSelection::AfterSendHours(1)])
        };
        assert_eq!(
            build(&form, None, now()),
            Err(ValidationError::NonPositiveHours { field: "customFrequencyHours" })
        );
    }

    #[test]
    fn custom_frequency_defaults_to_a_day_and_target_to_unread() {
        let form = ReminderForm {
            frequency: FrequencyChoice::Custom,
            ..enabled_form(vec![
                TimingSelection::AfterSendHours(4),
                TimingSelection::BeforeDeadlineHours(24),
                TimingSelection::AfterSendHours(4),
            ])
        };
        let policy = build(&form, Some(now() + Duration::days(3)), now()).unwrap();

        assert!(policy.enabled);
        assert_eq!(
            policy.frequency,
            Frequency::Custom(NonZeroU32::new(DEFAULT_CUSTOM_FREQUENCY_HOURS).unwrap())
        );
        assert_eq!(policy.target, Audience::Unread);
        assert_eq!(
            policy.timing,
            vec![
                TimingRule::AfterSend(NonZeroU32::new(4).unwrap()),
                TimingRule::BeforeDeadline(NonZeroU32::new(24).unwrap()),
            ]
        );
        assert!(policy.has_before_deadline_rule());
    }
}
