//! Follow-up chat about the explained letter, plain and streaming (SSE).

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use axum::routing::post;
use axum::{Json, Router};
use briefhulp_chat::StreamChunk;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::error::{ApiResult, MSG_LLM_FAILED};
use crate::state::AppState;

type SseStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions/{id}/chat", post(chat))
        .route("/sessions/{id}/chat/stream", post(stream_chat))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    question: String,
}

/// Events of the streaming chat.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamEvent {
    Token { content: String },
    Done { answer: String },
    Error { error: String },
}

impl StreamEvent {
    fn to_event(&self) -> Event {
        Event::default().data(serde_json::to_string(self).unwrap_or_default())
    }
}

/// POST /api/sessions/{id}/chat
async fn chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let session = state.sessions.get(&id)?;
    let (letter, summary) = session.result()?;

    let answer = state
        .assistant
        .answer(letter, summary, &session.transcript, &req.question)
        .await?;
    let session = state.sessions.append_exchange(
        &id,
        session.result_id,
        req.question.trim(),
        &answer,
    )?;

    Ok(Json(json!({
        "answer": answer,
        "transcript": session.transcript,
    })))
}

/// POST /api/sessions/{id}/chat/stream: tokens as SSE, the exchange is
/// added to the transcript once the answer is complete.
async fn stream_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Sse<SseStream>> {
    let session = state.sessions.get(&id)?;
    let (letter, summary) = session.result()?;
    let mut llm_stream = state
        .assistant
        .answer_stream(letter, summary, &session.transcript, &req.question)?;

    let question = req.question.trim().to_string();
    let result_id = session.result_id;
    let sse_stream: SseStream = Box::pin(async_stream::stream! {
        let mut answer = String::new();
        while let Some(chunk) = llm_stream.next().await {
            match chunk {
                StreamChunk::Token(text) => {
                    answer.push_str(&text);
                    yield Ok::<_, Infallible>(StreamEvent::Token { content: text }.to_event());
                }
                StreamChunk::Done { .. } => break,
                StreamChunk::Error(e) => {
                    warn!("Chat stream failed: {}", e);
                    yield Ok(StreamEvent::Error { error: MSG_LLM_FAILED.into() }.to_event());
                    return;
                }
            }
        }

        let answer = answer.trim().to_string();
        if let Err(e) = state.sessions.append_exchange(&id, result_id, &question, &answer) {
            warn!("Could not store chat exchange: {}", e);
        }
        yield Ok(StreamEvent::Done { answer }.to_event());
        yield Ok(Event::default().data("[DONE]"));
    });

    Ok(Sse::new(sse_stream))
}
