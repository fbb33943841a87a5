//! services/client/src/adapters/http.rs
//!
//! This module contains the REST adapter, the concrete implementation of the
//! service ports from the `core` crate. It handles all interactions with the
//! EduConnect backend using `reqwest`.
//!
//! Credentials travel in an explicit `AuthContext` owned by each `HttpApi`
//! value. Nothing is attached to a process-wide default header, so two
//! sessions can share one connection pool without seeing each other's token.

use async_trait::async_trait;
use bytes::Bytes;
use educonnect_core::domain::{
    AccountDraft, AuthGrant, ClassGroup, Message, Notification, ReactionKind, Reply, ReplyDraft,
    StudentProfile, User,
};
use educonnect_core::draft::ValidatedDraft;
use educonnect_core::ports::{
    AccountService, AuthService, MessageService, NotificationSource, PortError, PortResult,
    ProfileService, RosterService, UploadService,
};
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::adapters::records::{
    AccountPayload, ClassRecord, ErrorBody, ListPayload, LoginRequest, LoginResponse,
    MessagePayload, MessageRecord, NotificationRecord, ReplyPayload, ReplyRecord,
    StudentProfileRecord, UnreadCountResponse, UploadResponse, UserRecord,
};
use crate::config::Config;

//=========================================================================================
// Auth Context
//=========================================================================================

/// The bearer credential for one session. Anonymous until login.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    token: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A REST adapter that implements every backend-facing port.
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    auth: AuthContext,
}

impl HttpApi {
    /// Creates a new anonymous `HttpApi` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> PortResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| PortError::Unexpected(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: AuthContext::anonymous(),
        })
    }

    pub fn from_config(config: &Config) -> PortResult<Self> {
        Self::new(&config.api_url, config.request_timeout)
    }

    /// A copy of this adapter that sends `auth` on every request.
    /// The underlying connection pool is shared.
    pub fn with_auth(&self, auth: AuthContext) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            auth,
        }
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "api request");
        let builder = self.client.request(method, self.endpoint(path));
        match self.auth.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> PortResult<T> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            PortError::Unexpected(format!("API response was malformed JSON: {e}"))
        })
    }

    async fn send_empty(&self, request: RequestBuilder) -> PortResult<()> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.map_err(transport_error)?;
        Err(status_error(status, &body))
    }

    async fn fetch_messages(&self, path: &str) -> PortResult<Vec<Message>> {
        let payload: ListPayload<MessageRecord> =
            self.send_json(self.request(Method::GET, path)).await?;
        Ok(payload
            .into_vec()
            .into_iter()
            .map(MessageRecord::to_domain)
            .collect())
    }

    async fn fetch_users(&self, path: &str) -> PortResult<Vec<User>> {
        let payload: ListPayload<UserRecord> =
            self.send_json(self.request(Method::GET, path)).await?;
        payload
            .into_vec()
            .into_iter()
            .map(UserRecord::to_domain)
            .collect()
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn transport_error(error: reqwest::Error) -> PortError {
    if error.is_timeout() {
        PortError::Network(format!("request timed out: {error}"))
    } else if error.is_connect() {
        PortError::Network(format!("connection failed: {error}"))
    } else if error.is_decode() {
        PortError::Unexpected(format!("response could not be read: {error}"))
    } else {
        PortError::Network(error.to_string())
    }
}

fn status_error(status: StatusCode, body: &str) -> PortError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && !trimmed.starts_with('{')).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized(message),
        StatusCode::NOT_FOUND => PortError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE => PortError::Network(message),
        _ => PortError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for HttpApi {
    async fn login(&self, email: &str, password: &str, remember_me: bool) -> PortResult<AuthGrant> {
        let request = self.request(Method::POST, "auth/login").json(&LoginRequest {
            email,
            password,
            remember_me,
        });
        let response: LoginResponse = self.send_json(request).await?;
        Ok(AuthGrant {
            token: response.token,
            user: response.user.to_domain()?,
        })
    }

    async fn forgot_password(&self, email: &str) -> PortResult<()> {
        let request = self
            .request(Method::POST, "auth/forgot-password")
            .json(&json!({ "email": email }));
        self.send_empty(request).await
    }

    async fn reset_password(&self, email: &str, otp: &str, new_password: &str) -> PortResult<()> {
        let request = self.request(Method::POST, "auth/reset-password").json(&json!({
            "email": email,
            "otp": otp,
            "newPassword": new_password,
        }));
        self.send_empty(request).await
    }

    async fn change_password(&self, old_password: &str, new_password: &str) -> PortResult<()> {
        let request = self.request(Method::POST, "auth/change-password").json(&json!({
            "oldPassword": old_password,
            "newPassword": new_password,
        }));
        self.send_empty(request).await
    }
}

//=========================================================================================
// `MessageService` Trait Implementation
//=========================================================================================

#[async_trait]
impl MessageService for HttpApi {
    async fn list_sent(&self) -> PortResult<Vec<Message>> {
        self.fetch_messages("teacher/messages").await
    }

    async fn create_message(&self, draft: &ValidatedDraft) -> PortResult<Message> {
        let request = self
            .request(Method::POST, "teacher/messages")
            .json(&MessagePayload::from_draft(draft));
        let record: MessageRecord = self.send_json(request).await?;
        Ok(record.to_domain())
    }

    async fn update_message(
        &self,
        message_id: Uuid,
        draft: &ValidatedDraft,
    ) -> PortResult<Message> {
        let request = self
            .request(Method::PUT, &format!("teacher/messages/{message_id}"))
            .json(&MessagePayload::from_draft(draft));
        let record: MessageRecord = self.send_json(request).await?;
        Ok(record.to_domain())
    }

    async fn delete_message(&self, message_id: Uuid) -> PortResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("teacher/messages/{message_id}")))
            .await
    }

    async fn list_received(&self) -> PortResult<Vec<Message>> {
        self.fetch_messages("student/messages").await
    }

    async fn get_received(&self, message_id: Uuid) -> PortResult<Message> {
        let record: MessageRecord = self
            .send_json(self.request(Method::GET, &format!("student/messages/{message_id}")))
            .await?;
        Ok(record.to_domain())
    }

    async fn mark_message_read(&self, message_id: Uuid) -> PortResult<()> {
        self.send_empty(self.request(Method::POST, &format!("student/messages/{message_id}/read")))
            .await
    }

    async fn submit_reply(&self, message_id: Uuid, reply: &ReplyDraft) -> PortResult<Reply> {
        let request = self
            .request(Method::POST, &format!("student/messages/{message_id}/replies"))
            .json(&ReplyPayload::from_draft(reply));
        let record: ReplyRecord = self.send_json(request).await?;
        Ok(record.to_domain())
    }

    async fn edit_reply(
        &self,
        message_id: Uuid,
        reply_id: Uuid,
        reply: &ReplyDraft,
    ) -> PortResult<Reply> {
        let request = self
            .request(
                Method::PUT,
                &format!("student/messages/{message_id}/replies/{reply_id}"),
            )
            .json(&ReplyPayload::from_draft(reply));
        let record: ReplyRecord = self.send_json(request).await?;
        Ok(record.to_domain())
    }

    async fn set_reaction(&self, message_id: Uuid, kind: ReactionKind) -> PortResult<()> {
        let request = self
            .request(Method::PUT, &format!("student/messages/{message_id}/reaction"))
            .json(&json!({ "reaction": kind.as_str() }));
        self.send_empty(request).await
    }

    async fn clear_reaction(&self, message_id: Uuid) -> PortResult<()> {
        self.send_empty(self.request(
            Method::DELETE,
            &format!("student/messages/{message_id}/reaction"),
        ))
        .await
    }
}

//=========================================================================================
// `RosterService`, `ProfileService` and `AccountService` Trait Implementations
//=========================================================================================

#[async_trait]
impl RosterService for HttpApi {
    async fn list_classes(&self) -> PortResult<Vec<ClassGroup>> {
        let payload: ListPayload<ClassRecord> =
            self.send_json(self.request(Method::GET, "teacher/classes")).await?;
        Ok(payload
            .into_vec()
            .into_iter()
            .map(ClassRecord::to_domain)
            .collect())
    }

    async fn list_students(&self, class_id: Option<Uuid>) -> PortResult<Vec<User>> {
        match class_id {
            Some(id) => self.fetch_users(&format!("teacher/students?classId={id}")).await,
            None => self.fetch_users("teacher/students").await,
        }
    }
}

#[async_trait]
impl ProfileService for HttpApi {
    async fn student_profile(&self) -> PortResult<StudentProfile> {
        let record: StudentProfileRecord = self
            .send_json(self.request(Method::GET, "student/profile"))
            .await?;
        Ok(record.to_domain())
    }
}

#[async_trait]
impl AccountService for HttpApi {
    async fn list_users(&self) -> PortResult<Vec<User>> {
        self.fetch_users("admin/users").await
    }

    async fn create_user(&self, account: &AccountDraft) -> PortResult<User> {
        let request = self
            .request(Method::POST, "admin/users")
            .json(&AccountPayload::from_draft(account));
        let record: UserRecord = self.send_json(request).await?;
        record.to_domain()
    }

    async fn update_user(&self, user_id: Uuid, account: &AccountDraft) -> PortResult<User> {
        let request = self
            .request(Method::PUT, &format!("admin/users/{user_id}"))
            .json(&AccountPayload::from_draft(account));
        let record: UserRecord = self.send_json(request).await?;
        record.to_domain()
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("admin/users/{user_id}")))
            .await
    }
}

//=========================================================================================
// `NotificationSource` Trait Implementation
//=========================================================================================

#[async_trait]
impl NotificationSource for HttpApi {
    async fn unread_count(&self) -> PortResult<u64> {
        let response: UnreadCountResponse = self
            .send_json(self.request(Method::GET, "notifications/unread-count"))
            .await?;
        Ok(response.count)
    }

    async fn list(&self) -> PortResult<Vec<Notification>> {
        let payload: ListPayload<NotificationRecord> =
            self.send_json(self.request(Method::GET, "notifications")).await?;
        Ok(payload
            .into_vec()
            .into_iter()
            .filter_map(NotificationRecord::to_domain)
            .collect())
    }

    async fn mark_read(&self, notification_id: Uuid) -> PortResult<()> {
        self.send_empty(self.request(Method::PUT, &format!("notifications/{notification_id}/read")))
            .await
    }

    async fn mark_all_read(&self) -> PortResult<()> {
        self.send_empty(self.request(Method::PUT, "notifications/read-all"))
            .await
    }

    async fn delete(&self, notification_id: Uuid) -> PortResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("notifications/{notification_id}")))
            .await
    }
}

//=========================================================================================
// `UploadService` Trait Implementation
//=========================================================================================

#[async_trait]
impl UploadService for HttpApi {
    async fn upload(&self, file_name: &str, data: Bytes) -> PortResult<String> {
        let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let response: UploadResponse = self
            .send_json(self.request(Method::POST, "upload").multipart(form))
            .await?;
        Ok(response.url)
    }
}
