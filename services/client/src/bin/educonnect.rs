//! services/client/src/bin/educonnect.rs

use bytes::Bytes;
use chrono::{DateTime, Local, NaiveDate, Offset, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use client_lib::{
    adapters::{FileStore, HttpApi, MemoryStore},
    config::Config,
    error::ClientError,
    i18n::Language,
    messaging::{class_recipients, Composer, Inbox},
    poller::NotificationPoller,
    session::{StoredCredential, TabSession},
};
use educonnect_core::deadline::{self, ResponseWindow};
use educonnect_core::domain::{Message, MessageDraft, ReactionKind, ReplyDraft, Role, User};
use educonnect_core::filter::{
    self, DateRange, FilterCriteria, ReadFilter, ReplyStatus, SortOrder,
};
use educonnect_core::notifications::NotificationState;
use educonnect_core::ports::{
    AccountService, AuthService, PortError, ProfileService, RosterService,
};
use educonnect_core::reminder::{Audience, FrequencyChoice, ReminderForm, TimingSelection};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "educonnect", version, about = "EduConnect school messaging client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Keep the credential for later runs.
        #[arg(long, default_value_t = false)]
        remember_me: bool,
    },
    Logout,
    Whoami,
    #[command(name = "forgot-password")]
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    #[command(name = "reset-password")]
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        otp: String,
        #[arg(long)]
        new_password: String,
    },
    #[command(name = "change-password")]
    ChangePassword {
        #[arg(long)]
        old_password: String,
        #[arg(long)]
        new_password: String,
    },
    /// List received messages (students) or sent messages (teachers).
    Messages {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, conflicts_with = "not_replied")]
        replied: bool,
        #[arg(long)]
        not_replied: bool,
        #[arg(long, conflicts_with = "read")]
        unread: bool,
        #[arg(long)]
        read: bool,
        #[arg(long)]
        sent_from: Option<NaiveDate>,
        #[arg(long)]
        sent_to: Option<NaiveDate>,
        #[arg(long)]
        deadline_from: Option<NaiveDate>,
        #[arg(long)]
        deadline_to: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = SortArg::Newest)]
        sort: SortArg,
    },
    /// Show one received message and mark it read.
    Open { id: Uuid },
    Reply {
        id: Uuid,
        #[arg(long)]
        text: String,
    },
    React {
        id: Uuid,
        /// One of like, thanks, understood, star, question, idea, great, done.
        kind: ReactionKind,
    },
    Notifications {
        /// Keep polling and print the unread count whenever it changes.
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
    #[command(name = "read-all")]
    ReadAll,
    /// Compose and send a message, optionally with a deadline and reminders.
    Send(SendArgs),
    #[command(name = "delete-message")]
    DeleteMessage { id: Uuid },
    /// Classes taught by the signed-in teacher.
    Classes,
    Students {
        #[arg(long)]
        class: Option<Uuid>,
    },
    Profile,
    /// All accounts (admin only).
    Users,
    Language { code: Language },
}

#[derive(Args, Debug)]
struct SendArgs {
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    content: String,
    /// Recipient student id. Repeatable.
    #[arg(long = "to")]
    to: Vec<Uuid>,
    /// Every student in this class. Repeatable.
    #[arg(long = "class")]
    classes: Vec<Uuid>,
    /// File to upload and attach. Repeatable.
    #[arg(long = "attach")]
    attachments: Vec<PathBuf>,
    /// RFC 3339, e.g. 2024-05-20T17:00:00Z.
    #[arg(long)]
    deadline: Option<DateTime<Utc>>,
    /// Refuse replies and reactions once the deadline has passed.
    #[arg(long, default_value_t = false)]
    lock: bool,
    /// Remind N hours after sending. Repeatable.
    #[arg(long = "remind-after")]
    remind_after: Vec<u32>,
    /// Remind N hours before the deadline. Repeatable.
    #[arg(long = "remind-before")]
    remind_before: Vec<u32>,
    /// Repeat reminders every N hours instead of sending each once.
    #[arg(long)]
    every: Option<u32>,
    #[arg(long, value_enum, default_value_t = TargetArg::Unread)]
    target: TargetArg,
}

impl SendArgs {
    /// Reminders are on as soon as one timing flag is given.
    fn reminder_form(&self) -> ReminderForm {
        let timing: Vec<TimingSelection> = self
            .remind_after
            .iter()
            .map(|h| TimingSelection::AfterSendHours(*h))
            .chain(self.remind_before.iter().map(|h| TimingSelection::BeforeDeadlineHours(*h)))
            .collect();
        ReminderForm {
            enabled: !timing.is_empty(),
            timing,
            frequency: match self.every {
                Some(_) => FrequencyChoice::Custom,
                None => FrequencyChoice::Once,
            },
            custom_frequency_hours: self.every,
            target: Some(self.target.into()),
        }
    }

    fn draft(&self, recipient_ids: Vec<Uuid>, attachments: Vec<String>) -> MessageDraft {
        MessageDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            recipient_ids,
            attachments,
            deadline: self.deadline,
            lock_response_after_deadline: self.lock,
            reminder: self.reminder_form(),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TargetArg {
    Unread,
    ReadNoReply,
}

impl From<TargetArg> for Audience {
    fn from(value: TargetArg) -> Self {
        match value {
            TargetArg::Unread => Audience::Unread,
            TargetArg::ReadNoReply => Audience::ReadNoReply,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortArg {
    Newest,
    Oldest,
    Deadline,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Newest => SortOrder::NewestFirst,
            SortArg::Oldest => SortOrder::OldestFirst,
            SortArg::Deadline => SortOrder::DeadlineSoonest,
        }
    }
}

struct App {
    config: Config,
    api: HttpApi,
    session: TabSession,
    language: Language,
}

impl App {
    fn credential(&self) -> Result<StoredCredential, ClientError> {
        self.session
            .restore()?
            .ok_or_else(|| ClientError::Port(PortError::Unauthorized("unauthorized".to_string())))
    }

    fn authed(&self) -> Result<(StoredCredential, HttpApi), ClientError> {
        let credential = self.credential()?;
        let api = self.api.with_auth(credential.auth_context());
        Ok((credential, api))
    }
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!(api_url = %config.api_url, "configuration loaded");

    // --- 2. Initialize Adapters ---
    let api = HttpApi::from_config(&config)?;
    let local = Arc::new(FileStore::open(config.state_dir.join("local.json")));
    let session = TabSession::new(Arc::new(MemoryStore::new()), local);
    let language = session.language(config.language)?;
    let app = App { config, api, session, language };

    // --- 3. Run the Command ---
    let cli = Cli::parse();
    if let Err(err) = run(&app, cli.command).await {
        error!(error = %err, "command failed");
        eprintln!("{}", err.user_message(app.language));
        std::process::exit(1);
    }
    Ok(())
}

async fn run(app: &App, command: Commands) -> Result<(), ClientError> {
    match command {
        Commands::Login { email, password, remember_me } => {
            let user = app.session.login(&app.api, &email, &password, remember_me).await?;
            println!("Signed in as {} <{}> ({})", user.full_name, user.email, user.role);
            if !remember_me {
                println!(
                    "The session ends with this process. Use --remember-me to stay signed in."
                );
            }
        }
        Commands::Logout => {
            app.session.logout()?;
            println!("Signed out.");
        }
        Commands::Whoami => match app.session.restore()? {
            Some(credential) => println!(
                "{} <{}> ({})",
                credential.user.full_name, credential.user.email, credential.user.role
            ),
            None => println!("Not signed in."),
        },
        Commands::ForgotPassword { email } => {
            app.api.forgot_password(&email).await?;
            println!("If the account exists, a reset code has been sent to {email}.");
        }
        Commands::ResetPassword { email, otp, new_password } => {
            app.api.reset_password(&email, &otp, &new_password).await?;
            println!("Password reset. You can sign in now.");
        }
        Commands::ChangePassword { old_password, new_password } => {
            let (_, api) = app.authed()?;
            api.change_password(&old_password, &new_password).await?;
            println!("Password changed.");
        }
        Commands::Messages {
            search,
            replied,
            not_replied,
            unread,
            read,
            sent_from,
            sent_to,
            deadline_from,
            deadline_to,
            sort,
        } => {
            let criteria = FilterCriteria {
                search_text: search,
                reply_status: match (replied, not_replied) {
                    (true, _) => ReplyStatus::Replied,
                    (_, true) => ReplyStatus::NotReplied,
                    _ => ReplyStatus::All,
                },
                read_status: match (read, unread) {
                    (true, _) => ReadFilter::Read,
                    (_, true) => ReadFilter::Unread,
                    _ => ReadFilter::All,
                },
                sent_range: DateRange { from: sent_from, to: sent_to },
                deadline_range: DateRange { from: deadline_from, to: deadline_to },
                utc_offset: Local::now().offset().fix(),
            };
            let (credential, api) = app.authed()?;
            let api = Arc::new(api);
            let messages = match credential.user.role {
                Role::Student => {
                    Inbox::new(api, credential.user.id)
                        .list(&criteria, sort.into())
                        .await?
                }
                Role::Teacher | Role::Admin => {
                    let sent = Composer::new(api.clone(), api).sent().await?;
                    let mut matching = filter::apply(&sent, &criteria, credential.user.id);
                    filter::sort(&mut matching, sort.into());
                    matching.into_iter().cloned().collect()
                }
            };
            if messages.is_empty() {
                println!("No messages.");
            }
            for message in &messages {
                print_summary(message);
            }
        }
        Commands::Open { id } => {
            let (credential, api) = app.authed()?;
            let message = Inbox::new(Arc::new(api), credential.user.id).open(id).await?;
            print_summary(&message);
            if !message.content.is_empty() {
                println!("\n{}", message.content);
            }
            for attachment in &message.attachments {
                println!("  attachment: {attachment}");
            }
        }
        Commands::Reply { id, text } => {
            let (credential, api) = app.authed()?;
            let inbox = Inbox::new(Arc::new(api), credential.user.id);
            let message = inbox.open(id).await?;
            let draft = ReplyDraft { content: text, attachments: vec![] };
            inbox.reply(&message, &draft, Utc::now()).await?;
            println!("Reply sent.");
        }
        Commands::React { id, kind } => {
            let (credential, api) = app.authed()?;
            let inbox = Inbox::new(Arc::new(api), credential.user.id);
            let message = inbox.open(id).await?;
            inbox.react(&message, kind, Utc::now()).await?;
            println!("Reacted with {}.", kind.as_str());
        }
        Commands::Notifications { watch } => {
            let (_, api) = app.authed()?;
            let poller = NotificationPoller::new(
                Arc::new(api),
                Arc::new(Mutex::new(NotificationState::new())),
            );
            poller.open_panel().await?;
            {
                let state = poller.state();
                let state = state.lock().await;
                println!("{} unread", state.unread_count());
                for n in state.items() {
                    let marker = if n.is_read { " " } else { "*" };
                    println!(
                        "{marker} {} [{}] {}",
                        n.created_at.format("%Y-%m-%d %H:%M"),
                        n.kind.as_str(),
                        n.title
                    );
                }
            }
            if watch {
                poller.close_panel().await;
                let handle = poller.start(app.config.poll_interval);
                let state = poller.state();
                let mut last = state.lock().await.unread_count();
                let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
                let ctrl_c = tokio::signal::ctrl_c();
                tokio::pin!(ctrl_c);
                loop {
                    tokio::select! {
                        _ = &mut ctrl_c => break,
                        _ = ticker.tick() => {
                            let current = state.lock().await.unread_count();
                            if current != last {
                                println!("{current} unread");
                                last = current;
                            }
                        }
                    }
                }
                handle.stop().await?;
            }
        }
        Commands::ReadAll => {
            let (_, api) = app.authed()?;
            NotificationPoller::new(Arc::new(api), Arc::new(Mutex::new(NotificationState::new())))
                .mark_all_read()
                .await?;
            println!("All notifications marked read.");
        }
        Commands::Send(args) => {
            let (_, api) = app.authed()?;
            let api = Arc::new(api);
            let mut recipients = args.to.clone();
            for id in class_recipients(&*api, &args.classes).await? {
                if !recipients.contains(&id) {
                    recipients.push(id);
                }
            }
            // Reject a bad form before spending uploads on it.
            args.draft(recipients.clone(), Vec::new()).validate(Utc::now())?;

            let composer = Composer::new(api.clone(), api);
            let mut attachments = Vec::with_capacity(args.attachments.len());
            for path in &args.attachments {
                let file_name = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .ok_or_else(|| {
                        ClientError::Internal(format!("not a file path: {}", path.display()))
                    })?;
                let data = tokio::fs::read(path).await?;
                attachments.push(composer.attach(file_name, Bytes::from(data)).await?);
            }
            let message = composer
                .send(&args.draft(recipients, attachments), Utc::now())
                .await?;
            println!("Message sent.");
            print_summary(&message);
        }
        Commands::DeleteMessage { id } => {
            let (_, api) = app.authed()?;
            let api = Arc::new(api);
            Composer::new(api.clone(), api).delete(id).await?;
            println!("Message deleted.");
        }
        Commands::Classes => {
            let (_, api) = app.authed()?;
            for class in api.list_classes().await? {
                println!("{}  {}  {} students", class.id, class.name, class.student_ids.len());
            }
        }
        Commands::Students { class } => {
            let (_, api) = app.authed()?;
            print_users(&api.list_students(class).await?);
        }
        Commands::Profile => {
            let (_, api) = app.authed()?;
            let profile = api.student_profile().await?;
            println!("{} <{}>", profile.full_name, profile.email);
            if let Some(class_name) = &profile.class_name {
                println!("class: {class_name}");
            }
        }
        Commands::Users => {
            let (_, api) = app.authed()?;
            print_users(&api.list_users().await?);
        }
        Commands::Language { code } => {
            app.session.set_language(code)?;
            println!("Language set to {code}.");
        }
    }
    Ok(())
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("No users.");
    }
    for user in users {
        println!("{}  {} <{}> ({})", user.id, user.full_name, user.email, user.role);
    }
}

fn print_summary(message: &Message) {
    let now = Utc::now();
    let sender = message
        .sender
        .as_ref()
        .and_then(|s| s.full_name.clone().or_else(|| s.email.clone()))
        .unwrap_or_else(|| "unknown sender".to_string());
    let window = match deadline::status(message, now) {
        ResponseWindow::Open => match deadline::time_remaining(message, now) {
            Some(left) => format!("due in {}h", left.num_hours()),
            None => String::new(),
        },
        ResponseWindow::Expired => "past deadline".to_string(),
        ResponseWindow::ExpiredLocked => "past deadline, locked".to_string(),
    };
    println!(
        "{}  {}  {}  {}  {}",
        message.id,
        message.created_at.format("%Y-%m-%d"),
        sender,
        message.title,
        window
    );
}
