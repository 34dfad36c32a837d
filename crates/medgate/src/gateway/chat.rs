//! Chat endpoints: triage, prompt selection, upstream completion
//!
//! `POST /api/chat` runs severity triage on the user message, picks a system
//! prompt, and forwards the conversation to the upstream model server.
//! Streaming requests get an SSE stream of visible-content and reasoning
//! snapshots as the reasoning extractor resolves the transcript; the final
//! event carries severity metadata and, for critical messages, the emergency
//! guidance banner.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::gateway::server::{AppState, error_response};
use crate::gateway::sse::{DONE_FRAME, SseEvent, SseFrameBuffer, data_frame, delta_content};
use crate::thinking::{ExtractionResult, extract_thinking, extract_thinking_streaming};
use crate::triage::{
    EMERGENCY_RESPONSE, MedicalPrompt, Severity, detect_severity, select_prompt, system_prompt,
};

/// Request body for the chat endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_type: Option<String>,
    #[serde(default)]
    pub stream: bool,
}

/// Non-streaming chat response
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub severity: Severity,
    pub prompt: &'static str,
    #[serde(rename = "emergencyGuidance", skip_serializing_if = "Option::is_none")]
    pub emergency_guidance: Option<&'static str>,
}

fn emergency_guidance(severity: Severity) -> Option<&'static str> {
    (severity == Severity::Critical).then_some(EMERGENCY_RESPONSE)
}

/// Handle `POST /api/chat`
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if request.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message must not be empty");
    }

    let severity = detect_severity(&request.message);
    let prompt = select_prompt(request.conversation_type.as_deref(), Some(&request.message));
    let system = system_prompt(prompt);

    tracing::info!(
        severity = %severity.as_str(),
        prompt = prompt.id,
        stream = request.stream,
        "chat request triaged"
    );

    if request.stream {
        return stream_chat(state, request, severity, prompt, system).await;
    }

    match state
        .upstream
        .chat_completion(&system, &request.message)
        .await
    {
        Ok(content) => {
            let extraction = extract_thinking(&content);
            Json(ChatReply {
                reply: extraction.cleaned_text,
                reasoning: extraction.thinking_content,
                severity,
                prompt: prompt.id,
                emergency_guidance: emergency_guidance(severity),
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "chat completion failed");
            error_response(StatusCode::BAD_GATEWAY, "Upstream model request failed")
        }
    }
}

/// Stream a chat completion to the client as SSE.
///
/// The upstream delta stream is accumulated into a transcript; after each
/// delta the incremental extractor re-resolves the transcript and an
/// `update` event is emitted whenever the visible or reasoning text changed.
/// Reasoning text is not monotonic (a partial close marker surfaces inside
/// the reasoning channel until the marker completes), so events carry full
/// snapshots rather than deltas.
async fn stream_chat(
    state: Arc<AppState>,
    request: ChatRequest,
    severity: Severity,
    prompt: &'static MedicalPrompt,
    system: String,
) -> Response {
    let mut upstream = match state
        .upstream
        .chat_completion_stream(&system, &request.message)
        .await
    {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "failed to open upstream stream");
            return error_response(StatusCode::BAD_GATEWAY, "Upstream model request failed");
        }
    };

    let (tx, rx) = tokio::sync::mpsc::channel::<std::result::Result<Bytes, std::io::Error>>(16);

    tokio::spawn(async move {
        let mut frames = SseFrameBuffer::new();
        let mut transcript = String::new();
        let mut last = ExtractionResult {
            cleaned_text: String::new(),
            thinking_content: None,
        };

        'read: while let Some(chunk) = upstream.next().await {
            let chunk = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "upstream stream interrupted");
                    break;
                }
            };

            for event in frames.push(&String::from_utf8_lossy(&chunk)) {
                match event {
                    SseEvent::Data(data) => {
                        let Some(delta) = delta_content(&data) else {
                            continue;
                        };
                        transcript.push_str(&delta);

                        let extraction = extract_thinking_streaming(&transcript);
                        if extraction == last {
                            continue;
                        }
                        let update = json!({
                            "type": "update",
                            "content": &extraction.cleaned_text,
                            "reasoning": &extraction.thinking_content,
                        });
                        if tx.send(Ok(Bytes::from(data_frame(&update)))).await.is_err() {
                            return;
                        }
                        last = extraction;
                    }
                    SseEvent::Done => break 'read,
                }
            }
        }

        // A final frame may arrive without a trailing blank line
        if let Some(SseEvent::Data(data)) = frames.finish() {
            if let Some(delta) = delta_content(&data) {
                transcript.push_str(&delta);
            }
        }

        // Final resolution uses the batch extractor so an unclosed reasoning
        // block at end of stream is surfaced as visible text
        let extraction = extract_thinking(&transcript);
        let complete = json!({
            "type": "complete",
            "content": extraction.cleaned_text,
            "reasoning": extraction.thinking_content,
            "severity": severity,
            "prompt": prompt.id,
            "emergencyGuidance": emergency_guidance(severity),
        });
        if tx.send(Ok(Bytes::from(data_frame(&complete)))).await.is_err() {
            return;
        }
        let _ = tx.send(Ok(Bytes::from_static(DONE_FRAME.as_bytes()))).await;
    });

    let body = Body::from_stream(ReceiverStream::new(rx));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .unwrap_or_else(|_| {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response")
        })
}

/// Request body for the create-chat endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct CreateChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Handle `POST /api/create-chat`: allocate a chat id and derive a quick
/// title from the first message
pub async fn create_chat_handler(Json(request): Json<CreateChatRequest>) -> Response {
    let id = Uuid::new_v4();
    let title = request
        .message
        .as_deref()
        .map(quick_title)
        .unwrap_or_else(|| "New Chat".to_string());

    tracing::debug!(chat_id = %id, title = %title, "chat created");

    Json(json!({ "id": id, "title": title })).into_response()
}

/// Leading question words stripped when titling a question
const QUESTION_WORDS: &[&str] = &[
    "how", "what", "when", "where", "why", "who", "can", "could", "would", "should", "is", "are",
    "do", "does", "did",
];

/// Derive a chat title from the first user message without calling a model.
///
/// Questions lose their leading question word and question marks; statements
/// use their first sentence. Very short or empty messages get the default.
pub fn quick_title(message: &str) -> String {
    let cleaned = message.trim();
    if cleaned.len() < 3 {
        return "New Chat".to_string();
    }

    if cleaned.contains('?') {
        let title = strip_question_word(cleaned).replace('?', "");
        if title.trim().len() > 3 {
            return cleanup_title(&title);
        }
    }

    let first_sentence = cleaned
        .split(['.', '!', '?'])
        .next()
        .unwrap_or(cleaned);
    cleanup_title(first_sentence)
}

fn strip_question_word(message: &str) -> &str {
    for word in QUESTION_WORDS {
        if let Some(head) = message.get(..word.len()) {
            if head.eq_ignore_ascii_case(word) {
                let rest = &message[word.len()..];
                if rest.starts_with(char::is_whitespace) {
                    return rest.trim_start();
                }
            }
        }
    }
    message
}

/// Strip surrounding quotes, collapse whitespace, and cap at 80 characters
fn cleanup_title(title: &str) -> String {
    let mut title = title.trim();
    title = title.strip_prefix(['"', '\'']).unwrap_or(title);
    title = title.strip_suffix(['"', '\'']).unwrap_or(title);

    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");
    let capped: String = collapsed.chars().take(80).collect();
    let capped = capped.trim();

    if capped.is_empty() {
        "New Chat".to_string()
    } else {
        capped.to_string()
    }
}
