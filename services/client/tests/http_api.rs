//! services/client/tests/http_api.rs
//!
//! Drives `HttpApi` and `TabSession` against a stub backend served by axum on
//! an ephemeral port.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use client_lib::{
    adapters::{AuthContext, HttpApi, MemoryStore},
    error::{ClientError, ErrorCategory},
    i18n::Language,
    poller::NotificationPoller,
    session::{CredentialScope, TabSession},
};
use educonnect_core::domain::{AccountDraft, NotificationKind, ReactionKind, ReplyDraft, Role};
use educonnect_core::notifications::NotificationState;
use educonnect_core::ports::{
    AccountService, AuthService, MessageService, NotificationSource, PortError, ProfileService,
    RosterService, UploadService,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

const TOKEN: &str = "t-abc";
const STUDENT_ID: &str = "00000000-0000-0000-0000-00000000002a";
const MESSAGE_ID: &str = "00000000-0000-0000-0000-000000000064";
const CLASS_ID: &str = "00000000-0000-0000-0000-000000000014";

/// Method, path with query, and JSON body (`Null` when empty) of each recorded call.
type Calls = Arc<std::sync::Mutex<Vec<(String, Value)>>>;

fn record(calls: &Calls, method: &Method, uri: &Uri, body: &[u8]) {
    let body = serde_json::from_slice(body).unwrap_or(Value::Null);
    calls.lock().unwrap().push((format!("{method} {uri}"), body));
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" }))).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != "secret" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response();
    }
    Json(json!({
        "token": TOKEN,
        "user": {
            "id": STUDENT_ID,
            "email": body["email"],
            "fullName": "Tran Minh",
            "role": "student"
        }
    }))
    .into_response()
}

async fn forgot_password(Json(body): Json<Value>) -> Response {
    if body["email"].as_str().is_some_and(|e| e.contains('@')) {
        StatusCode::OK.into_response()
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({ "message": "Email is required" }))).into_response()
    }
}

async fn change_password(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if body["oldPassword"] != "secret" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Old password is incorrect" })),
        )
            .into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn received(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "data": [{
            "id": MESSAGE_ID,
            "title": "Math HW",
            "content": "Exercises 1-5",
            "attachments": ["/uploads/hw.pdf"],
            "sender": { "id": "00000000-0000-0000-0000-000000000001", "fullName": "Ms. Hoa" },
            "createdAt": "2024-03-01T08:00:00Z",
            "deadline": "2099-03-08T08:00:00Z",
            "lockResponseAfterDeadline": true,
            "reminder": {
                "enabled": true,
                "frequency": "custom",
                "customFrequencyHours": 12,
                "timing": [{ "before_deadline": 24 }],
                "target": "unread"
            },
            "readStatus": [{ "recipientId": STUDENT_ID, "isRead": false }],
            "reactions": [{ "recipientId": STUDENT_ID, "reaction": "party" }],
            "replies": []
        }]
    }))
    .into_response()
}

async fn one_received(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if id != MESSAGE_ID {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "Message not found" })))
            .into_response();
    }
    received(headers).await
}

async fn reply(headers: HeaderMap, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "id": "00000000-0000-0000-0000-0000000000c8",
            "recipientId": STUDENT_ID,
            "content": body["content"],
            "attachments": body["attachments"],
            "createdAt": "2024-03-02T10:00:00Z",
            "messageId": id
        })),
    )
        .into_response()
}

async fn edit_reply(
    State(calls): State<Calls>,
    method: Method,
    uri: Uri,
    Path((id, reply_id)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    record(&calls, &method, &uri, &body);
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    Json(json!({
        "id": reply_id,
        "recipientId": STUDENT_ID,
        "content": body["content"],
        "createdAt": "2024-03-02T10:00:00Z",
        "updatedAt": "2024-03-02T11:00:00Z",
        "messageId": id
    }))
    .into_response()
}

/// Accepts anything and answers 204.
async fn recorded(State(calls): State<Calls>, method: Method, uri: Uri, body: Bytes) -> Response {
    record(&calls, &method, &uri, &body);
    StatusCode::NO_CONTENT.into_response()
}

fn student(id: &str, name: &str) -> Value {
    json!({ "id": id, "email": format!("{id}@school.edu"), "fullName": name, "role": "student" })
}

async fn classes(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        { "id": CLASS_ID, "className": "10A1", "studentIds": [STUDENT_ID] },
        { "id": "00000000-0000-0000-0000-000000000015", "name": "10A2" }
    ]))
    .into_response()
}

async fn students(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let minh = student(STUDENT_ID, "Tran Minh");
    match query.get("classId").map(String::as_str) {
        Some(CLASS_ID) => Json(json!([minh])).into_response(),
        Some(_) => Json(json!([])).into_response(),
        None => Json(json!({
            "data": [minh, student("00000000-0000-0000-0000-00000000002b", "Pham An")]
        }))
        .into_response(),
    }
}

async fn profile(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "id": STUDENT_ID,
        "email": "minh@school.edu",
        "fullName": "Tran Minh",
        "className": "10A1"
    }))
    .into_response()
}

async fn users(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([student(STUDENT_ID, "Tran Minh")])).into_response()
}

async fn save_user(
    State(calls): State<Calls>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    record(&calls, &method, &uri, &body);
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let id = uri
        .path()
        .rsplit('/')
        .next()
        .filter(|last| *last != "users")
        .unwrap_or("00000000-0000-0000-0000-0000000000ff")
        .to_string();
    Json(json!({
        "id": id,
        "email": body["email"],
        "fullName": body["fullName"],
        "role": body["role"]
    }))
    .into_response()
}

async fn reaction(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if body["reaction"] == "thanks" {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::BAD_REQUEST, "Unsupported reaction").into_response()
    }
}

async fn unread_count(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "unreadCount": 2 })).into_response()
}

async fn notifications(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        {
            "id": "00000000-0000-0000-0000-000000000101",
            "type": "new_message",
            "title": "Math HW",
            "message": "Ms. Hoa sent you a message",
            "isRead": false,
            "messageId": MESSAGE_ID,
            "createdAt": "2024-03-01T08:00:01Z"
        },
        {
            "id": "00000000-0000-0000-0000-000000000102",
            "type": "manual_reminder",
            "title": "Reminder: Math HW",
            "isRead": false,
            "createdAt": "2024-03-03T08:00:00Z"
        },
        {
            "id": "00000000-0000-0000-0000-000000000103",
            "type": "system_broadcast",
            "title": "Unknown kind",
            "createdAt": "2024-03-03T09:00:00Z"
        }
    ]))
    .into_response()
}

async fn read_all(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    StatusCode::OK.into_response()
}

async fn upload(headers: HeaderMap, body: Bytes) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    let raw = String::from_utf8_lossy(&body);
    let has_file = raw.contains("name=\"file\"") && raw.contains("filename=\"notes.pdf\"");
    if !is_multipart || !has_file {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "No file uploaded" })))
            .into_response();
    }
    Json(json!({ "url": "/uploads/abc-notes.pdf" })).into_response()
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::OK.into_response()
}

async fn spawn_recording_backend() -> (String, Calls) {
    let calls = Calls::default();
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(recorded))
        .route("/api/auth/change-password", post(change_password))
        .route("/api/student/messages", get(received))
        .route("/api/student/messages/{id}", get(one_received))
        .route("/api/student/messages/{id}/read", post(recorded))
        .route("/api/student/messages/{id}/replies", post(reply))
        .route("/api/student/messages/{id}/replies/{reply_id}", put(edit_reply))
        .route("/api/student/messages/{id}/reaction", put(reaction).delete(recorded))
        .route("/api/student/profile", get(profile))
        .route("/api/notifications", get(notifications))
        .route("/api/notifications/unread-count", get(unread_count))
        .route("/api/notifications/read-all", put(read_all))
        .route("/api/notifications/{id}", axum::routing::delete(recorded))
        .route("/api/notifications/{id}/read", put(recorded))
        .route("/api/upload", post(upload))
        .route("/api/teacher/messages", get(slow))
        .route("/api/teacher/classes", get(classes))
        .route("/api/teacher/students", get(students))
        .route("/api/admin/users", get(users).post(save_user))
        .route("/api/admin/users/{id}", put(save_user).delete(recorded))
        .with_state(calls.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), calls)
}

async fn spawn_backend() -> String {
    spawn_recording_backend().await.0
}

async fn signed_in_api() -> HttpApi {
    signed_in_recording_api().await.0
}

async fn signed_in_recording_api() -> (HttpApi, Calls) {
    let (base, calls) = spawn_recording_backend().await;
    let api = HttpApi::new(&base, Duration::from_secs(2))
        .unwrap()
        .with_auth(AuthContext::bearer(TOKEN));
    (api, calls)
}

fn recorded_calls(calls: &Calls) -> Vec<(String, Value)> {
    calls.lock().unwrap().clone()
}

#[tokio::test]
async fn login_through_tab_session_caches_per_tab() {
    let base = spawn_backend().await;
    let api = HttpApi::new(&base, Duration::from_secs(2)).unwrap();
    let local = Arc::new(MemoryStore::new());
    let session = TabSession::new(Arc::new(MemoryStore::new()), local.clone());

    let user = session.login(&api, "minh@school.edu", "secret", false).await.unwrap();
    assert_eq!(user.role, Role::Student);
    assert_eq!(user.full_name, "Tran Minh");

    let restored = session.restore().unwrap().unwrap();
    assert_eq!(restored.scope, CredentialScope::Tab);
    assert_eq!(restored.auth_context().token(), Some(TOKEN));

    let reloaded = TabSession::new(Arc::new(MemoryStore::new()), local);
    assert!(reloaded.restore().unwrap().is_none());
}

#[tokio::test]
async fn bad_password_is_an_auth_error_with_translated_text() {
    let base = spawn_backend().await;
    let api = HttpApi::new(&base, Duration::from_secs(2)).unwrap();
    let session = TabSession::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()));

    let err = session.login(&api, "minh@school.edu", "wrong", true).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Auth);
    assert_eq!(err.user_message(Language::En), "Incorrect email or password.");
    assert!(session.restore().unwrap().is_none());
}

#[tokio::test]
async fn received_messages_decode_from_the_wrapped_envelope() {
    let api = signed_in_api().await;
    let messages = api.list_received().await.unwrap();
    assert_eq!(messages.len(), 1);

    let message = &messages[0];
    assert_eq!(message.title, "Math HW");
    assert_eq!(message.read_statuses.len(), 1);
    assert!(message.reactions.is_empty());
    let reminder = message.reminder.as_ref().unwrap();
    assert!(reminder.enabled);
    assert!(reminder.has_before_deadline_rule());
    assert_eq!(
        message.sender.as_ref().and_then(|s| s.full_name.as_deref()),
        Some("Ms. Hoa")
    );
}

#[tokio::test]
async fn missing_message_maps_to_not_found() {
    let api = signed_in_api().await;
    let err = api.get_received(Uuid::from_u128(999)).await.unwrap_err();
    assert_eq!(err, PortError::NotFound("Message not found".into()));
}

#[tokio::test]
async fn missing_token_maps_to_unauthorized() {
    let base = spawn_backend().await;
    let api = HttpApi::new(&base, Duration::from_secs(2)).unwrap();
    let err = api.unread_count().await.unwrap_err();
    assert!(matches!(err, PortError::Unauthorized(_)));
}

#[tokio::test]
async fn reply_and_reaction_round_trip() {
    let api = signed_in_api().await;
    let message_id: Uuid = MESSAGE_ID.parse().unwrap();

    let draft = ReplyDraft {
        content: "Done, see attached".into(),
        attachments: vec!["/uploads/a.png".into()],
    };
    let reply = api.submit_reply(message_id, &draft).await.unwrap();
    assert_eq!(reply.content, "Done, see attached");
    assert_eq!(reply.attachments, vec!["/uploads/a.png".to_string()]);

    api.set_reaction(message_id, ReactionKind::Thanks).await.unwrap();
    let err = api.set_reaction(message_id, ReactionKind::Star).await.unwrap_err();
    assert_eq!(
        err,
        PortError::Rejected { status: 400, message: "Unsupported reaction".into() }
    );
}

#[tokio::test]
async fn poller_refreshes_from_the_backend() {
    let api = Arc::new(signed_in_api().await);
    let poller = NotificationPoller::new(api, Arc::new(Mutex::new(NotificationState::new())));

    poller.open_panel().await.unwrap();
    {
        let state = poller.state();
        let state = state.lock().await;
        assert_eq!(state.unread_count(), 2);
        let kinds: Vec<_> = state.items().iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NotificationKind::NewMessage, NotificationKind::ManualReminder]);
        assert_eq!(state.items()[0].body, "Ms. Hoa sent you a message");
    }

    poller.mark_all_read().await.unwrap();
    assert_eq!(poller.state().lock().await.unread_count(), 0);
}

#[tokio::test]
async fn upload_sends_a_multipart_file_field() {
    let api = signed_in_api().await;
    let url = api
        .upload("notes.pdf", Bytes::from_static(b"%PDF-1.4"))
        .await
        .unwrap();
    assert_eq!(url, "/uploads/abc-notes.pdf");
}

#[tokio::test]
async fn timeouts_are_retryable_network_errors() {
    let base = spawn_backend().await;
    let api = HttpApi::new(&base, Duration::from_millis(200))
        .unwrap()
        .with_auth(AuthContext::bearer(TOKEN));

    let err = ClientError::from(api.list_sent().await.unwrap_err());
    assert_eq!(err.category(), ErrorCategory::Network);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn password_endpoints_send_camel_case_bodies() {
    let base = spawn_backend().await;
    let anonymous = HttpApi::new(&base, Duration::from_secs(2)).unwrap();
    anonymous.forgot_password("minh@school.edu").await.unwrap();

    let api = anonymous.with_auth(AuthContext::bearer(TOKEN));
    api.change_password("secret", "new-secret").await.unwrap();
    let err = api.change_password("guess", "new-secret").await.unwrap_err();
    assert_eq!(
        err,
        PortError::Rejected { status: 400, message: "Old password is incorrect".into() }
    );
    assert!(matches!(
        anonymous.change_password("secret", "x").await,
        Err(PortError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn reset_password_posts_the_code_and_new_password() {
    let (base, calls) = spawn_recording_backend().await;
    let anonymous = HttpApi::new(&base, Duration::from_secs(2)).unwrap();
    anonymous
        .reset_password("minh@school.edu", "482913", "n3w-secret")
        .await
        .unwrap();

    let calls = recorded_calls(&calls);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "POST /api/auth/reset-password");
    assert_eq!(
        calls[0].1,
        json!({ "email": "minh@school.edu", "otp": "482913", "newPassword": "n3w-secret" })
    );
}

#[tokio::test]
async fn read_receipt_and_cleared_reaction_hit_their_endpoints() {
    let (api, calls) = signed_in_recording_api().await;
    let message_id: Uuid = MESSAGE_ID.parse().unwrap();

    api.mark_message_read(message_id).await.unwrap();
    api.clear_reaction(message_id).await.unwrap();

    assert_eq!(
        recorded_calls(&calls),
        vec![
            (format!("POST /api/student/messages/{MESSAGE_ID}/read"), Value::Null),
            (format!("DELETE /api/student/messages/{MESSAGE_ID}/reaction"), Value::Null),
        ]
    );
}

#[tokio::test]
async fn edit_reply_puts_to_the_reply_resource() {
    let (api, calls) = signed_in_recording_api().await;
    let message_id: Uuid = MESSAGE_ID.parse().unwrap();
    let reply_id = Uuid::from_u128(200);
    let draft = ReplyDraft { content: "Fixed question 3".into(), attachments: vec![] };

    let edited = api.edit_reply(message_id, reply_id, &draft).await.unwrap();
    assert_eq!(edited.id, reply_id);
    assert_eq!(edited.content, "Fixed question 3");
    assert!(edited.updated_at.is_some());

    let calls = recorded_calls(&calls);
    assert_eq!(calls[0].0, format!("PUT /api/student/messages/{MESSAGE_ID}/replies/{reply_id}"));
    assert_eq!(calls[0].1["content"], "Fixed question 3");
}

#[tokio::test]
async fn notification_read_and_delete_target_one_item() {
    let (api, calls) = signed_in_recording_api().await;
    let id = Uuid::from_u128(0x101);

    NotificationSource::mark_read(&api, id).await.unwrap();
    NotificationSource::delete(&api, id).await.unwrap();

    let paths: Vec<_> = recorded_calls(&calls).into_iter().map(|(path, _)| path).collect();
    assert_eq!(
        paths,
        vec![format!("PUT /api/notifications/{id}/read"), format!("DELETE /api/notifications/{id}")]
    );
}

#[tokio::test]
async fn roster_and_profile_decode() {
    let api = signed_in_api().await;
    let class_id: Uuid = CLASS_ID.parse().unwrap();

    let classes = api.list_classes().await.unwrap();
    assert_eq!(classes.len(), 2);
    assert_eq!(classes[0].name, "10A1");
    assert_eq!(classes[0].student_ids, vec![STUDENT_ID.parse::<Uuid>().unwrap()]);
    assert!(classes[1].student_ids.is_empty());

    assert_eq!(api.list_students(None).await.unwrap().len(), 2);
    let in_class = api.list_students(Some(class_id)).await.unwrap();
    assert_eq!(in_class.len(), 1);
    assert_eq!(in_class[0].full_name, "Tran Minh");

    let profile = api.student_profile().await.unwrap();
    assert_eq!(profile.class_name.as_deref(), Some("10A1"));
}

#[tokio::test]
async fn admin_accounts_round_trip() {
    let (api, calls) = signed_in_recording_api().await;
    assert_eq!(api.list_users().await.unwrap()[0].role, Role::Student);

    let mut account = AccountDraft {
        email: "hoa@school.edu".into(),
        full_name: "Nguyen Hoa".into(),
        role: Role::Teacher,
        password: Some("Temp#123".into()),
    };
    let created = api.create_user(&account).await.unwrap();
    assert_eq!(created.role, Role::Teacher);
    assert_eq!(created.id, Uuid::from_u128(0xff));

    account.password = None;
    let updated = api.update_user(created.id, &account).await.unwrap();
    assert_eq!(updated.id, created.id);
    api.delete_user(created.id).await.unwrap();

    let calls = recorded_calls(&calls);
    assert_eq!(calls[0].0, "POST /api/admin/users");
    assert_eq!(calls[0].1["password"], "Temp#123");
    assert_eq!(calls[1].0, format!("PUT /api/admin/users/{}", created.id));
    assert!(calls[1].1.get("password").is_none());
    assert_eq!(calls[2].0, format!("DELETE /api/admin/users/{}", created.id));

    let anonymous = HttpApi::new(&spawn_backend().await, Duration::from_secs(2)).unwrap();
    assert!(matches!(anonymous.list_users().await, Err(PortError::Unauthorized(_))));
}
