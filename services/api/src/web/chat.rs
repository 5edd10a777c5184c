//! services/api/src/web/chat.rs
//!
//! The shopping assistant endpoint, answering either as one JSON body or as a
//! server-sent event stream.

use crate::web::protocol::{ChatReplyData, ChatRequest, ChatResponse, ChatStreamEvent};
use crate::web::rest::port_error_response;
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use fit_advisor_core::ports::TextStream;
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::error;

/// Send a message to the shopping assistant.
///
/// With `stream: true` the answer arrives as `text/event-stream`, one JSON
/// object per event: `{"chunk", "done": false}` while generating, then
/// `{"done": true, "session_id"}`, or `{"error"}` if generation fails.
#[utoipa::path(
    post,
    path = "/ai/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The assistant's answer", body = ChatResponse),
        (status = 400, description = "Message empty or longer than 2000 characters"),
        (status = 503, description = "Generation service unavailable")
    )
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Response, (StatusCode, String)> {
    if payload.stream {
        let (session_id, chunks) = app_state
            .assistant
            .reply_stream(payload.session_id, payload.message, payload.context.as_ref())
            .await
            .map_err(port_error_response)?;

        return Ok(Sse::new(sse_events(session_id, chunks))
            .keep_alive(KeepAlive::default())
            .into_response());
    }

    let reply = app_state
        .assistant
        .reply(payload.session_id, &payload.message, payload.context.as_ref())
        .await
        .map_err(port_error_response)?;

    Ok(Json(ChatResponse {
        success: true,
        data: ChatReplyData {
            session_id: reply.session_id,
            response: reply.response,
        },
    })
    .into_response())
}

fn event(payload: &ChatStreamEvent) -> Event {
    Event::default().data(serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string()))
}

fn sse_events(
    session_id: String,
    mut chunks: TextStream,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        while let Some(item) = chunks.next().await {
            match item {
                Ok(chunk) => {
                    yield Ok::<Event, Infallible>(event(&ChatStreamEvent::Chunk { chunk, done: false }));
                }
                Err(e) => {
                    error!("Chat stream for session {} ended with an error: {}", session_id, e);
                    yield Ok(event(&ChatStreamEvent::Error { error: e.to_string() }));
                    return;
                }
            }
        }
        yield Ok(event(&ChatStreamEvent::Done { done: true, session_id }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fit_advisor_core::ports::PortError;

    #[test]
    fn stream_events_serialize_flat() {
        let chunk = serde_json::to_value(ChatStreamEvent::Chunk {
            chunk: "Hi".to_string(),
            done: false,
        })
        .unwrap();
        assert_eq!(chunk, serde_json::json!({"chunk": "Hi", "done": false}));

        let done = serde_json::to_value(ChatStreamEvent::Done {
            done: true,
            session_id: "s1".to_string(),
        })
        .unwrap();
        assert_eq!(done, serde_json::json!({"done": true, "session_id": "s1"}));
    }

    #[tokio::test]
    async fn stream_ends_with_done_or_error() {
        let ok: TextStream = Box::pin(futures::stream::iter(vec![Ok("a".to_string())]));
        let events: Vec<_> = sse_events("s1".to_string(), ok).collect().await;
        assert_eq!(events.len(), 2);

        let failing: TextStream = Box::pin(futures::stream::iter(vec![
            Ok("a".to_string()),
            Err(PortError::CollaboratorUnavailable("down".to_string())),
            Ok("never".to_string()),
        ]));
        let events: Vec<_> = sse_events("s1".to_string(), failing).collect().await;
        assert_eq!(events.len(), 2);
    }
}
