use super::stream::{StreamSink, consume_stream, tidy_text};
use super::{ChatMessage, ChatSession, MessageRole};
use crate::api::ApiClient;
use crate::error::{ApiError, StreamError};
use crate::store::ActiveChatStore;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const PAGE_SIZE: usize = 10;

const CHATS_PATH: &str = "/chats";
const MESSAGE_PATH: &str = "/message/new";

const WELCOME_TEXT: &str =
    "Hi! I help you cool off before impulse purchases. Tell me what you want to buy.";
const BACKEND_HINT: &str = "Check that the assistant backend is up and reachable.";

/// One page of the session list, already normalized across the envelope
/// variants the backend has served.
#[derive(Debug, Clone)]
pub struct SessionPage {
    pub sessions: Vec<ChatSession>,
    pub page: u64,
    pub has_more: bool,
}

/// State machine over session identity.
///
/// Exactly one session is active at a time; its id is persisted through
/// [`ActiveChatStore`] so it survives restarts. Every network failure inside
/// a transition is converted into a single synthetic assistant message —
/// the chat *is* the UI here, there is no separate error banner surface —
/// so no error escapes to the caller as an exception.
pub struct ChatSessionManager {
    api: Arc<ApiClient>,
    store: Arc<ActiveChatStore>,
    active: Option<String>,
    messages: Vec<ChatMessage>,
    sessions: Vec<ChatSession>,
    page: u64,
    has_more: bool,
}

impl ChatSessionManager {
    pub fn new(api: Arc<ApiClient>, store: Arc<ActiveChatStore>) -> Self {
        Self {
            api,
            store,
            active: None,
            messages: vec![Self::welcome_message()],
            sessions: Vec::new(),
            page: 1,
            has_more: false,
        }
    }

    fn welcome_message() -> ChatMessage {
        ChatMessage::assistant_with_id("welcome", WELCOME_TEXT)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Replace the message list with one synthetic assistant message
    /// describing the failure.
    fn fail(&mut self, stage_id: &str, error: &ApiError) {
        self.messages = vec![ChatMessage::assistant_with_id(
            stage_id,
            format!(
                "{} (error code: {}). {BACKEND_HINT}",
                error.message, error.code
            ),
        )];
    }

    /// Session selection on app start:
    /// (a) a persisted id is selected as-is — only its history is fetched;
    /// (b) otherwise the most recent listed session is selected and persisted;
    /// (c) otherwise a session is created lazily.
    pub async fn bootstrap(&mut self) {
        if let Some(stored) = self.store.get() {
            self.active = Some(stored);
            self.load_messages().await;
            return;
        }

        match self.fetch_page(1).await {
            Ok(page) => {
                self.apply_page(page);
                if let Some(first) = self.sessions.first() {
                    let id = first.id.clone();
                    self.select(&id).await;
                } else {
                    self.create().await;
                }
            }
            Err(error) => self.fail("init-error", &error),
        }
    }

    /// Switch to another session: persist the id and replace the in-memory
    /// messages with its history.
    pub async fn select(&mut self, id: &str) {
        self.active = Some(id.to_string());
        if let Err(error) = self.store.set(id) {
            tracing::warn!("failed to persist active chat id: {error}");
        }
        self.load_messages().await;
    }

    /// Create a fresh session, persist and select it, then refresh the list.
    pub async fn create(&mut self) {
        let created: Value = match self.api.post_json(&format!("{CHATS_PATH}/new"), &json!({})).await
        {
            Ok(value) => value,
            Err(error) => return self.fail("create-error", &error),
        };

        let Some(id) = created
            .get("chat_id")
            .or_else(|| created.get("id"))
            .and_then(Value::as_str)
        else {
            return self.fail(
                "create-error",
                &ApiError {
                    message: "backend returned a chat without an id".to_string(),
                    code: "BAD_RESPONSE".to_string(),
                    status: None,
                },
            );
        };

        let id = id.to_string();
        self.select(&id).await;
        match self.fetch_page(1).await {
            Ok(page) => self.apply_page(page),
            Err(error) => self.fail("create-error", &error),
        }
    }

    /// Delete the active session, then land on a valid one: the most recent
    /// remaining session, or a newly created one.
    pub async fn delete_active(&mut self) {
        let Some(id) = self.active.clone() else {
            return;
        };

        if let Err(error) = self.api.delete(&format!("{CHATS_PATH}/{id}")).await {
            return self.fail("delete-error", &error);
        }
        if let Err(error) = self.store.clear() {
            tracing::warn!("failed to clear active chat id: {error}");
        }
        self.active = None;
        self.messages = vec![Self::welcome_message()];

        match self.fetch_page(1).await {
            Ok(page) => {
                self.apply_page(page);
                if let Some(first) = self.sessions.first() {
                    let next = first.id.clone();
                    self.select(&next).await;
                } else {
                    self.create().await;
                }
            }
            Err(error) => self.fail("delete-error", &error),
        }
    }

    /// Fetch one page of the session list for display. Unlike the state
    /// transitions above, a failed page flip leaves the chat untouched.
    pub async fn load_page(&mut self, page: u64) -> Result<(), ApiError> {
        let page = self.fetch_page(page.max(1)).await?;
        self.apply_page(page);
        Ok(())
    }

    fn apply_page(&mut self, page: SessionPage) {
        self.sessions = page.sessions;
        self.page = page.page;
        self.has_more = page.has_more;
    }

    /// Page-based list fetch. The primary query shape is
    /// `page`/`size`/`sort`; backends that reject it with HTTP 422 get one
    /// retry with the older `page`/`per_page` naming.
    async fn fetch_page(&self, page: u64) -> Result<SessionPage, ApiError> {
        let primary = format!("{CHATS_PATH}?page={page}&size={PAGE_SIZE}&sort=updated_at,desc");
        let raw: Value = match self.api.get_json(&primary).await {
            Ok(value) => value,
            Err(error) if error.is_status(StatusCode::UNPROCESSABLE_ENTITY) => {
                let fallback = format!("{CHATS_PATH}?page={page}&per_page={PAGE_SIZE}");
                self.api.get_json(&fallback).await?
            }
            Err(error) => return Err(error),
        };
        Ok(normalize_page(&raw, page))
    }

    async fn load_messages(&mut self) {
        let Some(id) = self.active.clone() else {
            return;
        };

        let raw: Value = match self
            .api
            .get_json(&format!("{CHATS_PATH}/{id}/messages"))
            .await
        {
            Ok(value) => value,
            Err(error) => return self.fail("load-error", &error),
        };

        let items = raw
            .get("messages")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut messages: Vec<ChatMessage> = items
            .iter()
            .enumerate()
            .map(|(index, item)| normalize_wire_message(item, index))
            .map(|message| ChatMessage {
                text: tidy_text(&message.text),
                ..message
            })
            .collect();
        if messages.is_empty() {
            messages.push(Self::welcome_message());
        }
        self.messages = messages;
    }

    /// One chat exchange: the user message is appended, then an assistant
    /// placeholder which is updated in place as stream chunks arrive. A
    /// failed or empty stream falls back to the non-streaming call;
    /// cancellation keeps whatever text already arrived.
    pub async fn send(&mut self, text: &str, cancel: &CancellationToken, sink: &dyn StreamSink) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        let Some(chat_id) = self.active.clone() else {
            let notice = format!("No active chat to send to. {BACKEND_HINT}");
            sink.on_text(&notice);
            self.messages.push(ChatMessage::assistant(notice));
            return;
        };

        self.messages.push(ChatMessage::user(trimmed));
        let placeholder = ChatMessage::assistant("");
        let placeholder_id = placeholder.id.clone();
        self.messages.push(placeholder);

        match self
            .stream_exchange(&chat_id, trimmed, &placeholder_id, cancel, sink)
            .await
        {
            Ok(()) | Err(StreamError::Cancelled) => {}
            Err(error) => {
                tracing::debug!("streaming failed, using plain exchange: {error}");
                self.fallback_exchange(&chat_id, trimmed, &placeholder_id, sink)
                    .await;
            }
        }
    }

    async fn stream_exchange(
        &mut self,
        chat_id: &str,
        text: &str,
        placeholder_id: &str,
        cancel: &CancellationToken,
        sink: &dyn StreamSink,
    ) -> Result<(), StreamError> {
        let request = json!({"text": text, "chat_id": chat_id, "stream": true});
        let response = self
            .api
            .post_stream(MESSAGE_PATH, &request)
            .await
            .map_err(|error| StreamError::Read(error.to_string()))?;

        let index = self
            .messages
            .iter()
            .position(|message| message.id == placeholder_id);
        let messages = &mut self.messages;
        let result = consume_stream(response.bytes_stream(), cancel, |snapshot| {
            if let Some(index) = index
                && let Some(message) = messages.get_mut(index)
            {
                message.text = snapshot.to_string();
            }
            sink.on_text(snapshot);
        })
        .await;

        result.map(|_| ())
    }

    /// Non-streaming completion of the exchange. The response may carry
    /// `messages[]`, a single `message`, or be the assistant message itself;
    /// with none of those the full history is reloaded.
    async fn fallback_exchange(
        &mut self,
        chat_id: &str,
        text: &str,
        placeholder_id: &str,
        sink: &dyn StreamSink,
    ) {
        let request = json!({"text": text, "chat_id": chat_id});
        let raw: Value = match self.api.post_json(MESSAGE_PATH, &request).await {
            Ok(value) => value,
            Err(error) => {
                let description = format!(
                    "{} (error code: {}). {BACKEND_HINT}",
                    error.message, error.code
                );
                sink.on_text(&description);
                self.set_message_text(placeholder_id, &description);
                return;
            }
        };

        let incoming = extract_fallback_messages(&raw);
        let normalized: Vec<ChatMessage> = incoming
            .iter()
            .enumerate()
            .map(|(index, item)| normalize_wire_message(item, index))
            .map(|message| ChatMessage {
                text: tidy_text(&message.text),
                ..message
            })
            .collect();

        if normalized.is_empty() {
            self.load_messages().await;
        } else {
            let fresh: Vec<ChatMessage> = normalized
                .into_iter()
                .filter(|incoming| self.messages.iter().all(|known| known.id != incoming.id))
                .collect();
            if !fresh.is_empty() {
                self.messages.retain(|message| message.id != placeholder_id);
                self.messages.extend(fresh);
            }
        }

        if let Some(answer) = self
            .messages
            .iter()
            .rev()
            .find(|message| message.role == MessageRole::Assistant)
        {
            sink.on_text(&answer.text);
        }
    }

    fn set_message_text(&mut self, id: &str, text: &str) {
        if let Some(message) = self.messages.iter_mut().find(|message| message.id == id) {
            message.text = text.to_string();
        }
    }
}

/// Absorb the session-list envelope variants: a bare array or
/// `items`/`data`, page under `page`, limit under
/// `per_page`/`page_size`/`size`, total under `total`/`count`.
fn normalize_page(raw: &Value, requested_page: u64) -> SessionPage {
    let items: Vec<Value> = if let Some(array) = raw.as_array() {
        array.clone()
    } else {
        ["items", "data"]
            .iter()
            .find_map(|key| raw.get(*key).and_then(Value::as_array))
            .cloned()
            .unwrap_or_default()
    };

    let sessions: Vec<ChatSession> = items
        .iter()
        .enumerate()
        .map(|(index, item)| ChatSession {
            id: ["id", "chat_id"]
                .iter()
                .find_map(|key| item.get(*key).map(id_to_string))
                .flatten()
                .unwrap_or_else(|| index.to_string()),
            last_updated: ["updated_at", "last_message_at", "created_at"]
                .iter()
                .find_map(|key| item.get(*key).and_then(Value::as_str))
                .and_then(parse_timestamp),
        })
        .collect();

    let page = raw
        .get("page")
        .and_then(Value::as_u64)
        .unwrap_or(requested_page);
    let limit = ["per_page", "page_size", "size"]
        .iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_u64))
        .unwrap_or(PAGE_SIZE as u64);
    let total = ["total", "count"]
        .iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_u64))
        .unwrap_or(sessions.len() as u64);

    let has_more = total > page.saturating_mul(limit) || sessions.len() as u64 == limit;
    SessionPage {
        sessions,
        page,
        has_more,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// History/fallback rows: backend-assigned id when present, role defaulting
/// to assistant, text under `text`/`content`/`message`.
fn normalize_wire_message(value: &Value, _index: usize) -> ChatMessage {
    let id = value
        .get("id")
        .and_then(id_to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let role = match value.get("role").and_then(Value::as_str) {
        Some("user") => MessageRole::User,
        _ => MessageRole::Assistant,
    };
    let text = ["text", "content", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .unwrap_or("")
        .to_string();
    ChatMessage { id, role, text }
}

/// The non-streaming `/message/new` response has shipped in three shapes.
fn extract_fallback_messages(raw: &Value) -> Vec<Value> {
    if let Some(messages) = raw.get("messages").and_then(Value::as_array) {
        return messages.clone();
    }
    if let Some(message) = raw.get("message").filter(|value| value.is_object()) {
        return vec![message.clone()];
    }
    if raw.get("role").is_some() && raw.get("content").is_some() {
        return vec![raw.clone()];
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::NullStreamSink;
    use crate::store::TokenStore;
    use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Fixture {
        manager: ChatSessionManager,
        store: Arc<ActiveChatStore>,
        _dir: tempfile::TempDir,
    }

    fn fixture(server: &MockServer) -> Fixture {
        let dir = tempfile::TempDir::new().unwrap();
        let tokens = Arc::new(TokenStore::new(dir.path()));
        let api = Arc::new(ApiClient::with_base_url(server.uri(), tokens));
        let store = Arc::new(ActiveChatStore::new(dir.path()));
        Fixture {
            manager: ChatSessionManager::new(api, Arc::clone(&store)),
            store,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn bootstrap_with_persisted_id_only_fetches_history() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats/chat-7/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [
                    {"id": "m1", "role": "user", "content": "buy a drone?"},
                    {"id": "m2", "role": "assistant", "content": "wait 3 days"},
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chats/new"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut fx = fixture(&server);
        fx.store.set("chat-7").unwrap();
        fx.manager.bootstrap().await;

        assert_eq!(fx.manager.active_id(), Some("chat-7"));
        assert_eq!(fx.manager.messages().len(), 2);
        assert_eq!(fx.manager.messages()[0].role, MessageRole::User);
        assert_eq!(fx.manager.messages()[1].text, "wait 3 days");
    }

    #[tokio::test]
    async fn bootstrap_with_empty_backend_creates_exactly_one_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [], "total": 0, "page": 1, "size": 10, "pages": 0
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chats/new"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "fresh-1", "title": "Chat"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chats/fresh-1/messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"messages": []})),
            )
            .mount(&server)
            .await;

        let mut fx = fixture(&server);
        fx.manager.bootstrap().await;

        assert_eq!(fx.manager.active_id(), Some("fresh-1"));
        assert_eq!(fx.store.get().as_deref(), Some("fresh-1"));
        // Empty history renders the greeting.
        assert_eq!(fx.manager.messages()[0].id, "welcome");
    }

    #[tokio::test]
    async fn bootstrap_selects_most_recent_listed_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "recent", "updated_at": "2025-05-02T10:00:00Z"},
                    {"id": "older", "updated_at": "2025-04-30T10:00:00Z"},
                ],
                "total": 2, "page": 1, "size": 10,
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chats/recent/messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"messages": []})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chats/new"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut fx = fixture(&server);
        fx.manager.bootstrap().await;

        assert_eq!(fx.manager.active_id(), Some("recent"));
        assert_eq!(fx.store.get().as_deref(), Some("recent"));
        assert!(
            fx.manager.sessions()[0].last_updated.is_some(),
            "timestamps should parse"
        );
    }

    #[tokio::test]
    async fn list_retries_with_per_page_on_422() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .and(query_param("size", "10"))
            .respond_with(ResponseTemplate::new(422))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .and(query_param("per_page", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"chat_id": "a"}], "count": 1, "page": 1, "per_page": 10
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut fx = fixture(&server);
        fx.manager.load_page(1).await.unwrap();

        assert_eq!(fx.manager.sessions().len(), 1);
        assert_eq!(fx.manager.sessions()[0].id, "a");
        assert!(!fx.manager.has_more());
    }

    #[tokio::test]
    async fn history_failure_becomes_synthetic_assistant_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats/gone/messages"))
            .respond_with(ResponseTemplate::new(404).set_body_json(
                serde_json::json!({"message": "chat not found", "code": "CHAT_NOT_FOUND"}),
            ))
            .mount(&server)
            .await;

        let mut fx = fixture(&server);
        fx.store.set("gone").unwrap();
        fx.manager.bootstrap().await;

        let messages = fx.manager.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::Assistant);
        assert!(messages[0].text.contains("chat not found"));
        assert!(messages[0].text.contains("CHAT_NOT_FOUND"));
    }

    #[tokio::test]
    async fn delete_lands_on_a_valid_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats/doomed/messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"messages": []})),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/chats/doomed"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"items": [], "total": 0, "page": 1, "size": 10}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chats/new"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "next-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chats/next-1/messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"messages": []})),
            )
            .mount(&server)
            .await;

        let mut fx = fixture(&server);
        fx.store.set("doomed").unwrap();
        fx.manager.bootstrap().await;
        fx.manager.delete_active().await;

        assert_eq!(fx.manager.active_id(), Some("next-1"));
        assert_eq!(fx.store.get().as_deref(), Some("next-1"));
    }

    #[tokio::test]
    async fn send_streams_into_the_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats/c1/messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"messages": []})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/message/new"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "data: {\"content\":\"Wait \"}\ndata: {\"content\":\"three days.\"}\n",
                "text/event-stream",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let mut fx = fixture(&server);
        fx.store.set("c1").unwrap();
        fx.manager.bootstrap().await;
        fx.manager
            .send("should I buy it?", &CancellationToken::new(), &NullStreamSink)
            .await;

        let messages = fx.manager.messages();
        // welcome + user + assistant
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, MessageRole::User);
        assert_eq!(messages[2].role, MessageRole::Assistant);
        assert_eq!(messages[2].text, "Wait three days.");
    }

    #[tokio::test]
    async fn empty_stream_falls_back_to_plain_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats/c1/messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"messages": []})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/message/new"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw("", "text/event-stream"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/message/new"))
            .and(body_json(
                serde_json::json!({"text": "hello", "chat_id": "c1"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"id": "srv-1", "role": "assistant", "content": "From fallback"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut fx = fixture(&server);
        fx.store.set("c1").unwrap();
        fx.manager.bootstrap().await;
        fx.manager
            .send("hello", &CancellationToken::new(), &NullStreamSink)
            .await;

        let last = fx.manager.messages().last().unwrap();
        assert_eq!(last.id, "srv-1");
        assert_eq!(last.text, "From fallback");
        // The empty placeholder was replaced, not duplicated.
        assert_eq!(fx.manager.messages().len(), 3);
    }

    #[tokio::test]
    async fn fallback_failure_writes_error_into_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats/c1/messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"messages": []})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/message/new"))
            .respond_with(ResponseTemplate::new(503).set_body_json(
                serde_json::json!({"message": "llm offline", "code": "LLM_DOWN"}),
            ))
            .mount(&server)
            .await;

        let mut fx = fixture(&server);
        fx.store.set("c1").unwrap();
        fx.manager.bootstrap().await;
        fx.manager
            .send("hello", &CancellationToken::new(), &NullStreamSink)
            .await;

        let last = fx.manager.messages().last().unwrap();
        assert_eq!(last.role, MessageRole::Assistant);
        assert!(last.text.contains("llm offline"));
        assert!(last.text.contains("LLM_DOWN"));
    }

    #[tokio::test]
    async fn cancelled_stream_keeps_partial_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats/c1/messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"messages": []})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/message/new"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "data: {\"content\":\"partial answer\"}\n",
                "text/event-stream",
            ))
            .mount(&server)
            .await;

        let mut fx = fixture(&server);
        fx.store.set("c1").unwrap();
        fx.manager.bootstrap().await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        fx.manager.send("hello", &cancel, &NullStreamSink).await;

        // Cancellation is not an error and not a fallback trigger: the
        // placeholder stays with whatever had arrived (possibly nothing).
        let last = fx.manager.messages().last().unwrap();
        assert_eq!(last.role, MessageRole::Assistant);
        assert_eq!(fx.manager.messages().len(), 3);
    }

    #[test]
    fn normalize_page_accepts_bare_arrays() {
        let page = normalize_page(
            &serde_json::json!([{"id": "x"}, {"chat_id": "y"}]),
            3,
        );
        assert_eq!(page.page, 3);
        assert_eq!(page.sessions.len(), 2);
        assert_eq!(page.sessions[1].id, "y");
    }

    #[test]
    fn normalize_page_has_more_when_total_exceeds_window() {
        let page = normalize_page(
            &serde_json::json!({"items": [{"id": "a"}], "total": 25, "page": 2, "size": 10}),
            2,
        );
        assert!(page.has_more);
    }

    #[test]
    fn normalize_page_full_page_implies_more() {
        let items: Vec<Value> = (0..PAGE_SIZE)
            .map(|index| serde_json::json!({"id": index.to_string()}))
            .collect();
        let page = normalize_page(&serde_json::json!(items), 1);
        assert!(page.has_more);
    }

    #[test]
    fn fallback_shapes_are_all_recognized() {
        let from_list = extract_fallback_messages(
            &serde_json::json!({"messages": [{"id": "1", "content": "a"}]}),
        );
        assert_eq!(from_list.len(), 1);

        let from_single = extract_fallback_messages(
            &serde_json::json!({"message": {"id": "1", "content": "a"}}),
        );
        assert_eq!(from_single.len(), 1);

        let from_bare = extract_fallback_messages(
            &serde_json::json!({"role": "assistant", "content": "a"}),
        );
        assert_eq!(from_bare.len(), 1);

        assert!(extract_fallback_messages(&serde_json::json!({"ok": true})).is_empty());
    }
}
