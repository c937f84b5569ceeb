//! Request handlers for the chat endpoints.
//!
//! Every endpoint answers JSON with a `response` key so the front end renders
//! one code path. The routing decision itself lives in [`route_reply`], a
//! plain async function over [`AppState`], which keeps it testable without a
//! listening socket.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Html;
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::Result;
use crate::server::{AppState, CONFIDENCE_THRESHOLD};
use crate::uploads::{self, UploadTicket};

/// 400 body when the message is empty after trimming.
pub const EMPTY_MESSAGE: &str = "Please enter a message.";

/// 500 body when reading or answering a message fails internally.
pub const CHAT_FAILURE: &str = "Sorry, something went wrong while processing your message.";

/// 500 body when storing an upload fails.
pub const UPLOAD_FAILURE: &str = "Sorry, there was an issue processing your file.";

/// Immediate acknowledgement for an accepted upload.
pub const UPLOAD_ACK: &str = "📎 Thanks for uploading your file! I'll take a moment to review it \
                              to better understand your issue. Please hold on while I process the \
                              details.";

/// Scripted follow-up for image uploads.
pub const IMAGE_FOLLOW_UP: &str = "🖼️ I've reviewed the image you uploaded. Could you please \
                                   provide your order number or the email linked to your account \
                                   so I can proceed with your request?";

/// Scripted follow-up for video uploads.
pub const VIDEO_FOLLOW_UP: &str = "🎥 I've reviewed your video and forwarded it to our \
                                   verification team. Could you please share your order ID and a \
                                   short description of the issue?";

/// Scripted follow-up for anything else.
pub const UNRELATED_FOLLOW_UP: &str = "⚠️ It seems your uploaded file might not relate to a \
                                       product issue. Please upload a clear photo or video of the \
                                       affected item or receipt so we can help you better.";

/// Milliseconds the front end waits before showing the follow-up.
pub const FOLLOW_UP_DELAY_MS: u64 = 20_000;

/// Longest message prefix echoed into the request log.
const LOG_PREVIEW_CHARS: usize = 80;

/// Body of `POST /get_response`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message; absent means empty.
    #[serde(default)]
    pub message: String,
}

/// Which side produced the reply text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Dataset,
    Ai,
}

/// Outcome of routing one message.
#[derive(Debug, Clone)]
pub struct RoutedReply {
    /// The text sent back to the user.
    pub text: String,
    /// Where the text came from.
    pub source: ReplySource,
    /// Predicted intent, when a model was consulted.
    pub intent: Option<String>,
    /// Confidence of that prediction.
    pub confidence: Option<f64>,
}

/// Decide how to answer a trimmed, non-empty message.
///
/// The classifier sees the lowercased message; the AI fallback sees the
/// original. A canned reply requires both a confidence strictly above the
/// threshold and a response recorded for the predicted intent, otherwise the
/// message goes to the fallback. Without a model everything goes to the
/// fallback.
pub async fn route_reply(state: &AppState, message: &str) -> Result<RoutedReply> {
    if let Some(model) = &state.model {
        let prediction = model.pipeline.predict(&message.to_lowercase())?;
        if prediction.confidence > CONFIDENCE_THRESHOLD {
            if let Some(text) = model.response_for(&prediction.intent) {
                return Ok(RoutedReply {
                    text: text.to_string(),
                    source: ReplySource::Dataset,
                    intent: Some(prediction.intent),
                    confidence: Some(prediction.confidence),
                });
            }
        }
        let text = state.ai.reply(message).await;
        return Ok(RoutedReply {
            text,
            source: ReplySource::Ai,
            intent: Some(prediction.intent),
            confidence: Some(prediction.confidence),
        });
    }

    let text = state.ai.reply(message).await;
    Ok(RoutedReply {
        text,
        source: ReplySource::Ai,
        intent: None,
        confidence: None,
    })
}

/// Follow-up message for a stored upload, keyed by its extension.
pub fn follow_up_for_extension(extension: &str) -> &'static str {
    match extension {
        "png" | "jpg" | "jpeg" => IMAGE_FOLLOW_UP,
        "mp4" | "mov" => VIDEO_FOLLOW_UP,
        _ => UNRELATED_FOLLOW_UP,
    }
}

/// Copy of a message capped at [`LOG_PREVIEW_CHARS`] characters for logging.
fn preview(message: &str) -> String {
    if message.chars().count() <= LOG_PREVIEW_CHARS {
        return message.to_string();
    }
    let cut: String = message.chars().take(LOG_PREVIEW_CHARS).collect();
    format!("{cut}...")
}

/// `GET /` serves the chat page.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

/// `POST /get_response` answers one chat message.
///
/// A body that cannot be parsed is answered like any other internal failure,
/// so the client always sees the `{"response": ...}` shape.
pub async fn get_response(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            error!("failed to read chat request body: {rejection}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "response": CHAT_FAILURE })),
            );
        }
    };

    let message = request.message.trim();
    if message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "response": EMPTY_MESSAGE })),
        );
    }

    match route_reply(&state, message).await {
        Ok(reply) => {
            match (&reply.intent, reply.confidence) {
                (Some(intent), Some(confidence)) => info!(
                    "answered \"{}\" via {:?} (intent {intent}, confidence {confidence:.3})",
                    preview(message),
                    reply.source
                ),
                _ => info!(
                    "answered \"{}\" via {:?} (no model loaded)",
                    preview(message),
                    reply.source
                ),
            }
            (StatusCode::OK, Json(json!({ "response": reply.text })))
        }
        Err(e) => {
            error!("failed to answer message: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "response": CHAT_FAILURE })),
            )
        }
    }
}

/// `POST /upload_file` accepts one attachment from a multipart form.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut upload: Option<(String, UploadTicket, Vec<u8>)> = None;

    while let Ok(Some(mut field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(|name| name.to_string());

        // Read the field a chunk at a time and stop once it passes the size
        // ceiling, so an arbitrarily large body never accumulates in memory.
        // Validation below still picks the rejection, keeping the observed
        // check order: presence, then extension, then size.
        let mut bytes: Vec<u8> = Vec::new();
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    bytes.extend_from_slice(&chunk);
                    if bytes.len() as u64 > uploads::MAX_UPLOAD_BYTES {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("failed to read upload body: {e}");
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "response": UPLOAD_FAILURE })),
                    );
                }
            }
        }

        match uploads::validate_upload(file_name.as_deref(), bytes.len() as u64) {
            Ok(ticket) => {
                upload = Some((file_name.unwrap_or_default(), ticket, bytes));
            }
            Err(rejection) => {
                warn!("upload rejected: {rejection:?}");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "response": rejection.message() })),
                );
            }
        }
        break;
    }

    let Some((client_name, ticket, bytes)) = upload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "response": uploads::UploadRejection::Missing.message() })),
        );
    };

    match uploads::store_upload(&state.uploads_dir, &client_name, &ticket, &bytes) {
        Ok(stored) => {
            info!(
                "accepted {} upload as {}",
                ticket.extension, stored.file_name
            );
            (
                StatusCode::OK,
                Json(json!({
                    "response": UPLOAD_ACK,
                    "follow_up": follow_up_for_extension(&ticket.extension),
                    "delay": FOLLOW_UP_DELAY_MS,
                })),
            )
        }
        Err(e) => {
            error!("failed to store upload: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "response": UPLOAD_FAILURE })),
            )
        }
    }
}
