//! crates/fit_advisor_core/src/chat.rs
//!
//! Bounded, expiring chat history and the shopping assistant that uses it.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::domain::{ChatContext, ChatMessage, ChatReply, ChatRole, NamedItem};
use crate::ports::{
    GenerationRequest, GenerationService, KeyValueStore, PortError, PortResult, TextStream,
};
use crate::prompts::CHAT_SYSTEM_PROMPT;
use crate::validation::validate_chat_message;

//=========================================================================================
// Chat Session Store
//=========================================================================================

/// Per-session message log in the key-value store.
///
/// `max_history` counts exchanges, so at most `2 * max_history` messages
/// are kept. Each append renews the session's expiry.
#[derive(Clone)]
pub struct ChatSessionStore {
    kv: Arc<dyn KeyValueStore>,
    max_history: usize,
    ttl: Duration,
}

impl ChatSessionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, max_history: usize, ttl: Duration) -> Self {
        Self {
            kv,
            max_history,
            ttl,
        }
    }

    fn key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }

    /// Maximum number of messages retained per session.
    pub fn capacity(&self) -> usize {
        self.max_history * 2
    }

    pub async fn append(&self, session_id: &str, role: ChatRole, content: &str) -> PortResult<()> {
        let key = Self::key(session_id);
        let entry = serde_json::to_string(&ChatMessage {
            role,
            content: content.to_string(),
        })
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        self.kv.list_append(&key, &entry).await?;
        self.kv.expire(&key, self.ttl).await?;
        self.kv.list_trim(&key, self.capacity()).await
    }

    /// Stored messages, oldest first. Unknown sessions have an empty history.
    pub async fn history(&self, session_id: &str) -> PortResult<Vec<ChatMessage>> {
        let raw = self.kv.list_range(&Self::key(session_id)).await?;
        let mut messages: Vec<ChatMessage> = raw
            .iter()
            .filter_map(|entry| match serde_json::from_str(entry) {
                Ok(message) => Some(message),
                Err(e) => {
                    debug!("Skipping malformed chat entry in {}: {}", session_id, e);
                    None
                }
            })
            .collect();
        let excess = messages.len().saturating_sub(self.capacity());
        messages.drain(..excess);
        Ok(messages)
    }

    pub async fn clear(&self, session_id: &str) -> PortResult<()> {
        self.kv.delete(&Self::key(session_id)).await
    }
}

//=========================================================================================
// Chat Assistant
//=========================================================================================

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 1024;
const MAX_CONTEXT_ITEMS: usize = 5;

pub struct ChatAssistant {
    generator: Arc<dyn GenerationService>,
    sessions: ChatSessionStore,
}

impl ChatAssistant {
    pub fn new(generator: Arc<dyn GenerationService>, sessions: ChatSessionStore) -> Self {
        Self {
            generator,
            sessions,
        }
    }

    pub fn sessions(&self) -> &ChatSessionStore {
        &self.sessions
    }

    async fn build_request(
        &self,
        session_id: &str,
        message: &str,
        context: Option<&ChatContext>,
    ) -> PortResult<GenerationRequest> {
        let mut turns = self.sessions.history(session_id).await?;
        turns.push(ChatMessage::user(message));

        let mut instruction = CHAT_SYSTEM_PROMPT.to_string();
        if let Some(context) = context {
            instruction.push_str("\n\n## Shopper details\n");
            instruction.push_str(&format_context(context));
        }

        Ok(GenerationRequest {
            system_instruction: Some(instruction),
            turns,
            image: None,
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        })
    }

    /// Answers one message and records the exchange.
    pub async fn reply(
        &self,
        session_id: Option<String>,
        message: &str,
        context: Option<&ChatContext>,
    ) -> PortResult<ChatReply> {
        validate_chat_message(message)?;
        let session_id = session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        info!("Processing chat for session {} ({} chars)", session_id, message.len());

        let request = self.build_request(&session_id, message, context).await?;
        let response = self.generator.generate(request).await.map_err(|e| {
            error!("Chat processing failed for session {}: {}", session_id, e);
            unavailable(e)
        })?;

        self.sessions.append(&session_id, ChatRole::User, message).await?;
        self.sessions.append(&session_id, ChatRole::Model, &response).await?;
        info!("Chat completed for session {} ({} chars)", session_id, response.len());

        Ok(ChatReply {
            session_id,
            response,
        })
    }

    /// Streams the answer to one message. The exchange is recorded once the
    /// upstream stream has finished without error.
    pub async fn reply_stream(
        &self,
        session_id: Option<String>,
        message: String,
        context: Option<&ChatContext>,
    ) -> PortResult<(String, TextStream)> {
        validate_chat_message(&message)?;
        let session_id = session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        info!("Processing chat stream for session {}", session_id);

        let request = self.build_request(&session_id, &message, context).await?;
        let mut upstream = self
            .generator
            .generate_stream(request)
            .await
            .map_err(unavailable)?;

        let sessions = self.sessions.clone();
        let sid = session_id.clone();
        let stream = async_stream::stream! {
            let mut full = String::new();
            while let Some(item) = upstream.next().await {
                match item {
                    Ok(chunk) => {
                        full.push_str(&chunk);
                        yield Ok::<String, PortError>(chunk);
                    }
                    Err(e) => {
                        error!("Chat stream failed for session {}: {}", sid, e);
                        yield Err(unavailable(e));
                        return;
                    }
                }
            }
            let saved = async {
                sessions.append(&sid, ChatRole::User, &message).await?;
                sessions.append(&sid, ChatRole::Model, &full).await
            }
            .await;
            if let Err(e) = saved {
                yield Err(e);
            }
        };

        Ok((session_id, Box::pin(stream)))
    }
}

/// Renders shopper context as bullet lines for the system instruction.
pub fn format_context(context: &ChatContext) -> String {
    let mut parts = Vec::new();

    if let Some(name) = context.user_name.as_deref().filter(|n| !n.is_empty()) {
        parts.push(format!("- Name: {}", name));
    }
    if !context.cart_items.is_empty() {
        parts.push(format!("- Cart: {}", item_names(&context.cart_items)));
    }
    if !context.recent_views.is_empty() {
        parts.push(format!("- Recently viewed: {}", item_names(&context.recent_views)));
    }
    if let Some(prefs) = &context.preferences {
        if let Some(style) = &prefs.style {
            parts.push(format!("- Favourite style: {}", style));
        }
        if !prefs.sizes.is_empty() {
            parts.push(format!("- Usual sizes: {}", prefs.sizes.join(", ")));
        }
    }

    if parts.is_empty() {
        "No additional details".to_string()
    } else {
        parts.join("\n")
    }
}

/// Malformed output is reported as unavailable.
fn unavailable(e: PortError) -> PortError {
    match e {
        PortError::MalformedResponse(msg) => PortError::CollaboratorUnavailable(msg),
        other => other,
    }
}

fn item_names(items: &[NamedItem]) -> String {
    items
        .iter()
        .take(MAX_CONTEXT_ITEMS)
        .map(|item| item.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ShopperPreferences;
    use crate::testing::{MapStore, ScriptedGenerator};

    const TTL: Duration = Duration::from_secs(600);

    fn sessions(kv: Arc<MapStore>, max_history: usize) -> ChatSessionStore {
        ChatSessionStore::new(kv, max_history, TTL)
    }

    #[tokio::test]
    async fn history_keeps_the_most_recent_entries_in_order() {
        let kv = Arc::new(MapStore::default());
        let store = sessions(kv.clone(), 3);
        for i in 0..10 {
            store.append("s1", ChatRole::User, &format!("m{}", i)).await.unwrap();
        }

        let history = store.history("s1").await.unwrap();
        let contents: Vec<_> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m4", "m5", "m6", "m7", "m8", "m9"]);
        assert_eq!(kv.raw_list("session:s1").len(), 6);
        assert_eq!(kv.ttls.lock().unwrap()["session:s1"], TTL);
    }

    #[tokio::test]
    async fn malformed_entries_are_skipped() {
        let kv = Arc::new(MapStore::default());
        let store = sessions(kv.clone(), 5);
        store.append("s1", ChatRole::User, "hi").await.unwrap();
        kv.push_raw("session:s1", "{not json");
        store.append("s1", ChatRole::Model, "hello").await.unwrap();

        let history = store.history("s1").await.unwrap();
        assert_eq!(history, vec![ChatMessage::user("hi"), ChatMessage::model("hello")]);
    }

    #[tokio::test]
    async fn clear_removes_the_session() {
        let kv = Arc::new(MapStore::default());
        let store = sessions(kv, 5);
        store.append("s1", ChatRole::User, "hi").await.unwrap();
        store.clear("s1").await.unwrap();
        assert!(store.history("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reply_sends_history_and_records_the_exchange() {
        let kv = Arc::new(MapStore::default());
        let store = sessions(kv, 5);
        store.append("s1", ChatRole::User, "earlier").await.unwrap();
        store.append("s1", ChatRole::Model, "sure").await.unwrap();

        let generator = Arc::new(ScriptedGenerator::new(vec![Ok("Try the navy one".to_string())]));
        let assistant = ChatAssistant::new(generator.clone(), store.clone());
        let context = ChatContext {
            user_name: Some("Linh".to_string()),
            ..Default::default()
        };
        let reply = assistant
            .reply(Some("s1".to_string()), "Which jacket?", Some(&context))
            .await
            .unwrap();

        assert_eq!(reply.session_id, "s1");
        assert_eq!(reply.response, "Try the navy one");
        {
            let requests = generator.requests.lock().unwrap();
            let sent = &requests[0];
            assert_eq!(sent.turns.len(), 3);
            assert_eq!(sent.turns[2], ChatMessage::user("Which jacket?"));
            assert!(sent.system_instruction.as_deref().unwrap().contains("- Name: Linh"));
        }
        assert_eq!(store.history("s1").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn failed_reply_writes_nothing() {
        let kv = Arc::new(MapStore::default());
        let store = sessions(kv, 5);
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(
            PortError::CollaboratorUnavailable("no key".to_string()),
        )]));
        let assistant = ChatAssistant::new(generator, store.clone());

        let err = assistant
            .reply(Some("s1".to_string()), "hello", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::CollaboratorUnavailable(_)));
        assert!(store.history("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn new_sessions_get_an_id() {
        let store = sessions(Arc::new(MapStore::default()), 5);
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok("hey".to_string())]));
        let assistant = ChatAssistant::new(generator, store);
        let reply = assistant.reply(None, "hello", None).await.unwrap();
        assert!(uuid::Uuid::parse_str(&reply.session_id).is_ok());
    }

    #[tokio::test]
    async fn streamed_reply_is_recorded_after_completion() {
        let store = sessions(Arc::new(MapStore::default()), 5);
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok("a b c".to_string())]));
        let assistant = ChatAssistant::new(generator, store.clone());

        let (session_id, stream) = assistant
            .reply_stream(None, "hello".to_string(), None)
            .await
            .unwrap();
        let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks.concat(), "a b c");

        let history = store.history(&session_id).await.unwrap();
        assert_eq!(history, vec![ChatMessage::user("hello"), ChatMessage::model("a b c")]);
    }

    #[test]
    fn context_is_formatted_with_limits() {
        let items: Vec<NamedItem> = (1..=7)
            .map(|i| NamedItem {
                name: format!("item{}", i),
            })
            .collect();
        let context = ChatContext {
            user_name: None,
            cart_items: items.clone(),
            recent_views: Vec::new(),
            preferences: Some(ShopperPreferences {
                style: Some("minimal".to_string()),
                sizes: vec!["M".to_string(), "L".to_string()],
            }),
        };
        let text = format_context(&context);
        assert!(text.contains("- Cart: item1, item2, item3, item4, item5\n"));
        assert!(text.contains("- Favourite style: minimal"));
        assert!(text.contains("- Usual sizes: M, L"));
        assert_eq!(format_context(&ChatContext::default()), "No additional details");
    }
}
