pub mod deadline;
pub mod domain;
pub mod draft;
pub mod filter;
pub mod notifications;
pub mod ports;
pub mod reminder;

pub use deadline::ResponseWindow;
pub use domain::{
    AccountDraft, AuthGrant, ClassGroup, Message, MessageDraft, Notification, NotificationKind,
    Reaction, ReactionKind, ReadStatus, Reply, ReplyDraft, Role, Sender, StudentProfile, User,
};
pub use draft::ValidatedDraft;
pub use filter::{DateRange, FilterCriteria, ReadFilter, ReplyStatus, SortOrder};
pub use notifications::{NotificationSnapshot, NotificationState};
pub use ports::{
    AccountService, AuthService, KeyValueStore, MessageService, NotificationSource, PortError,
    PortResult, ProfileService, RosterService, UploadService,
};
pub use reminder::{
    Audience, Frequency, FrequencyChoice, ReminderForm, ReminderPolicy, TimingRule,
    TimingSelection, ValidationError,
};
