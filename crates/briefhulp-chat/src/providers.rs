//! Streaming clients for the hosted chat-completion APIs.
//!
//! OpenAI and Groq share the chat-completions SSE format; Anthropic's
//! Messages API has its own event types. Both go through one SSE reader.

use std::pin::Pin;

use briefhulp_core::{Error, Result};
use futures::Stream;
use reqwest::{Client, RequestBuilder};
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::{debug, error};

use crate::types::{ChatMessage, LLMProvider, ResolvedProvider, Role};

pub const DEFAULT_MAX_TOKENS: usize = 2048;
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub type BoxedStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

/// A single streamed token, the end of the stream, or a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Token(String),
    Done { tokens_used: usize },
    Error(String),
}

/// One completion call.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: usize,
}

impl LlmRequest {
    /// Deterministic request: temperature 0, default token limit.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// A single user turn.
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self::new(vec![ChatMessage::user(prompt)])
    }
}

/// Stream tokens from the provider in `target`.
pub fn stream_llm(client: &Client, target: &ResolvedProvider, request: LlmRequest) -> BoxedStream {
    debug!(
        "Streaming from {} ({}) with model {}",
        target.provider, target.base_url, target.model
    );
    match target.provider {
        LLMProvider::OpenAI | LLMProvider::Groq => {
            Box::pin(read_sse(openai_request(client, target, &request), parse_openai_data))
        }
        LLMProvider::Anthropic => Box::pin(read_sse(
            anthropic_request(client, target, &request),
            parse_anthropic_data,
        )),
    }
}

/// Run a request to completion and return the full text.
pub async fn complete(client: &Client, target: &ResolvedProvider, request: LlmRequest) -> Result<String> {
    let mut stream = stream_llm(client, target, request);
    let mut text = String::new();

    while let Some(chunk) = stream.next().await {
        match chunk {
            StreamChunk::Token(t) => text.push_str(&t),
            StreamChunk::Done { .. } => break,
            StreamChunk::Error(e) => return Err(Error::Llm(e)),
        }
    }

    if text.trim().is_empty() {
        return Err(Error::Llm(format!("{} returned an empty response", target.provider)));
    }
    Ok(text)
}

fn openai_request(client: &Client, target: &ResolvedProvider, request: &LlmRequest) -> RequestBuilder {
    let messages: Vec<serde_json::Value> = request
        .messages
        .iter()
        .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
        .collect();

    client
        .post(format!("{}/chat/completions", target.base_url))
        .bearer_auth(&target.api_key)
        .json(&json!({
            "model": target.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": true,
        }))
}

fn anthropic_request(client: &Client, target: &ResolvedProvider, request: &LlmRequest) -> RequestBuilder {
    let system: Vec<&str> = request
        .messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let messages: Vec<serde_json::Value> = request
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
        .collect();

    let mut body = json!({
        "model": target.model,
        "messages": messages,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
        "stream": true,
    });
    if !system.is_empty() {
        body["system"] = json!(system.join("\n\n"));
    }

    client
        .post(format!("{}/messages", target.base_url))
        .header("x-api-key", &target.api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&body)
}

/// What a single SSE `data:` payload means.
#[derive(Debug, PartialEq)]
enum SseEvent {
    Token(String),
    Stop,
    Error(String),
    Ignore,
}

fn parse_openai_data(data: &str) -> SseEvent {
    if data == "[DONE]" {
        return SseEvent::Stop;
    }
    let Ok(parsed) = serde_json::from_str::<serde_json::Value>(data) else {
        return SseEvent::Ignore;
    };
    if let Some(msg) = parsed["error"]["message"].as_str() {
        return SseEvent::Error(msg.to_string());
    }
    match parsed["choices"][0]["delta"]["content"].as_str() {
        Some(content) if !content.is_empty() => SseEvent::Token(content.to_string()),
        _ => SseEvent::Ignore,
    }
}

fn parse_anthropic_data(data: &str) -> SseEvent {
    let Ok(parsed) = serde_json::from_str::<serde_json::Value>(data) else {
        return SseEvent::Ignore;
    };
    match parsed["type"].as_str() {
        Some("content_block_delta") => match parsed["delta"]["text"].as_str() {
            Some(text) if !text.is_empty() => SseEvent::Token(text.to_string()),
            _ => SseEvent::Ignore,
        },
        Some("message_stop") => SseEvent::Stop,
        Some("error") => {
            let msg = parsed["error"]["message"].as_str().unwrap_or("Unknown error");
            error!("Anthropic error: {}", msg);
            SseEvent::Error(msg.to_string())
        }
        _ => SseEvent::Ignore,
    }
}

/// Splits a byte stream into SSE `data:` payloads. Bytes are buffered until
/// a full line is present, so multi-byte characters split across network
/// chunks decode correctly.
#[derive(Default)]
struct SseLines {
    buf: Vec<u8>,
}

impl SseLines {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut out = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(data) = line.trim().strip_prefix("data:") {
                out.push(data.trim_start().to_string());
            }
        }
        out
    }
}

fn read_sse(
    request: RequestBuilder,
    parse: fn(&str) -> SseEvent,
) -> impl Stream<Item = StreamChunk> + Send + 'static {
    async_stream::stream! {
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                yield StreamChunk::Error(format!("Request failed: {}", e));
                return;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            yield StreamChunk::Error(format!("API error {}: {}", status, body));
            return;
        }

        let mut bytes = response.bytes_stream();
        let mut lines = SseLines::default();
        let mut token_count = 0usize;

        while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(b) => b,
                Err(e) => {
                    yield StreamChunk::Error(format!("Stream read error: {}", e));
                    return;
                }
            };

            for data in lines.push(&chunk) {
                match parse(&data) {
                    SseEvent::Token(t) => {
                        token_count += 1;
                        yield StreamChunk::Token(t);
                    }
                    SseEvent::Stop => {
                        yield StreamChunk::Done { tokens_used: token_count };
                        return;
                    }
                    SseEvent::Error(e) => {
                        yield StreamChunk::Error(e);
                        return;
                    }
                    SseEvent::Ignore => {}
                }
            }
        }

        yield StreamChunk::Done { tokens_used: token_count };
    }
}

/// Check an API key by listing models.
pub async fn test_api_key(
    client: &Client,
    provider: LLMProvider,
    api_key: &str,
    base_url: &str,
) -> std::result::Result<(), String> {
    let url = format!("{}/models", base_url.trim_end_matches('/'));
    let request = match provider {
        LLMProvider::OpenAI | LLMProvider::Groq => client.get(&url).bearer_auth(api_key),
        LLMProvider::Anthropic => client
            .get(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION),
    };

    let resp = request.send().await.map_err(|e| e.to_string())?;
    if resp.status().is_success() {
        Ok(())
    } else {
        Err(format!("API returned status {}", resp.status()))
    }
}
