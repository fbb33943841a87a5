//! services/client/src/session.rs
//!
//! Per-tab session identity and credential caching.
//!
//! Two stores back a `TabSession`. The session store lives as long as one tab
//! (one process for the CLI) and holds the tab id together with that tab's
//! credential. The local store is shared and persistent, and only holds a
//! credential when the user asked to be remembered.

use educonnect_core::domain::{Role, User};
use educonnect_core::ports::{AuthService, KeyValueStore};
use educonnect_core::reminder::ValidationError;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapters::http::AuthContext;
use crate::adapters::records::UserRecord;
use crate::error::ClientError;
use crate::i18n::Language;

const TAB_ID_KEY: &str = "tabId";
const GLOBAL_TOKEN_KEY: &str = "token";
const GLOBAL_USER_KEY: &str = "user";
const LANGUAGE_KEY: &str = "language";

fn email_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::MissingField("email"));
    }
    match email_pattern() {
        Some(re) if !re.is_match(email.trim()) => Err(ValidationError::InvalidField {
            field: "email",
            reason: "not a valid email address".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Which storage scope a restored credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScope {
    Tab,
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub token: String,
    pub user: User,
    pub scope: CredentialScope,
}

impl StoredCredential {
    pub fn auth_context(&self) -> AuthContext {
        AuthContext::bearer(self.token.clone())
    }
}

pub struct TabSession {
    session: Arc<dyn KeyValueStore>,
    local: Arc<dyn KeyValueStore>,
}

impl TabSession {
    pub fn new(session: Arc<dyn KeyValueStore>, local: Arc<dyn KeyValueStore>) -> Self {
        Self { session, local }
    }

    /// Returns this tab's id, generating and storing one on first use.
    pub fn get_or_create_tab_id(&self) -> Result<String, ClientError> {
        if let Some(existing) = self.session.get(TAB_ID_KEY)? {
            if !existing.is_empty() {
                return Ok(existing);
            }
        }
        let tab_id = Uuid::new_v4().to_string();
        self.session.set(TAB_ID_KEY, &tab_id)?;
        Ok(tab_id)
    }

    fn tab_keys(&self) -> Result<(String, String), ClientError> {
        let tab_id = self.get_or_create_tab_id()?;
        Ok((format!("token_{tab_id}"), format!("user_{tab_id}")))
    }

    /// Authenticates and caches the credential for this tab, and globally
    /// when `remember_me` is set. A failed login leaves both stores untouched.
    pub async fn login(
        &self,
        auth: &dyn AuthService,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<User, ClientError> {
        validate_email(email)?;
        if password.is_empty() {
            return Err(ValidationError::MissingField("password").into());
        }

        let grant = auth.login(email.trim(), password, remember_me).await?;
        let user_json = serde_json::to_string(&UserRecord::from_domain(&grant.user))?;

        let (token_key, user_key) = self.tab_keys()?;
        self.session.set(&token_key, &grant.token)?;
        self.session.set(&user_key, &user_json)?;
        if remember_me {
            self.local.set(GLOBAL_TOKEN_KEY, &grant.token)?;
            self.local.set(GLOBAL_USER_KEY, &user_json)?;
        }

        info!(user_id = %grant.user.id, role = %grant.user.role, remember_me, "signed in");
        Ok(grant.user)
    }

    /// Clears the credential from both scopes.
    pub fn logout(&self) -> Result<(), ClientError> {
        let (token_key, user_key) = self.tab_keys()?;
        self.session.remove(&token_key)?;
        self.session.remove(&user_key)?;
        self.local.remove(GLOBAL_TOKEN_KEY)?;
        self.local.remove(GLOBAL_USER_KEY)?;
        info!("signed out");
        Ok(())
    }

    /// Finds a cached credential, tab scope first.
    ///
    /// A global credential is copied into the tab scope so later reads in this
    /// tab do not depend on the shared store.
    pub fn restore(&self) -> Result<Option<StoredCredential>, ClientError> {
        let (token_key, user_key) = self.tab_keys()?;

        if let Some((token, user)) = read_pair(self.session.as_ref(), &token_key, &user_key)? {
            return Ok(Some(StoredCredential { token, user, scope: CredentialScope::Tab }));
        }

        let global = read_pair(self.local.as_ref(), GLOBAL_TOKEN_KEY, GLOBAL_USER_KEY)?;
        let Some((token, user)) = global else {
            return Ok(None);
        };
        let user_json = serde_json::to_string(&UserRecord::from_domain(&user))?;
        self.session.set(&token_key, &token)?;
        self.session.set(&user_key, &user_json)?;
        Ok(Some(StoredCredential { token, user, scope: CredentialScope::Global }))
    }

    /// The persisted display language, or `fallback` when unset or unknown.
    pub fn language(&self, fallback: Language) -> Result<Language, ClientError> {
        let Some(raw) = self.local.get(LANGUAGE_KEY)? else {
            return Ok(fallback);
        };
        Ok(raw.parse().unwrap_or_else(|e: String| {
            warn!(error = %e, "ignoring stored language");
            fallback
        }))
    }

    pub fn set_language(&self, language: Language) -> Result<(), ClientError> {
        self.local.set(LANGUAGE_KEY, language.code())?;
        Ok(())
    }

    /// The last view the user had open for `role`. Survives reloads.
    pub fn active_tab(&self, role: Role) -> Result<Option<String>, ClientError> {
        Ok(self.local.get(&active_tab_key(role))?)
    }

    pub fn set_active_tab(&self, role: Role, tab: &str) -> Result<(), ClientError> {
        self.local.set(&active_tab_key(role), tab)?;
        Ok(())
    }
}

fn active_tab_key(role: Role) -> String {
    format!("active_tab_{}", role.as_str())
}

/// Reads a token/user pair. A pair with an unparseable user is cleared.
fn read_pair(
    store: &dyn KeyValueStore,
    token_key: &str,
    user_key: &str,
) -> Result<Option<(String, User)>, ClientError> {
    let (Some(token), Some(raw_user)) = (store.get(token_key)?, store.get(user_key)?) else {
        return Ok(None);
    };

    let parsed = serde_json::from_str::<UserRecord>(&raw_user)
        .map_err(|e| e.to_string())
        .and_then(|record| record.to_domain().map_err(|e| e.to_string()));

    match parsed {
        Ok(user) if !token.is_empty() => Ok(Some((token, user))),
        Ok(_) => Ok(None),
        Err(e) => {
            warn!(key = user_key, error = %e, "clearing corrupt cached user");
            store.remove(token_key)?;
            store.remove(user_key)?;
            Ok(None)
        }
    }
}
