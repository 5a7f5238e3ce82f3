//! Streaming chat endpoint.
//!
//! POST /api/chat
//!
//! Validates the turn and hands it to the orchestrator. Author questions
//! get a plain JSON reply. Model turns stream in the data-stream line
//! protocol once the first event is available, so a failure before any
//! output still gets a proper error status.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use parley_core::chat::TurnResponse;
use parley_types::chat::ChatTurnRequest;

use crate::http::error::AppError;
use crate::http::stream::{DATA_STREAM_CONTENT_TYPE, data_stream_body};
use crate::state::AppState;

pub const CHAT_ID_HEADER: &str = "x-chat-id";

fn chat_id_header(chat_id: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(chat_id)
        .map_err(|_| AppError::Validation("chatId is not a valid header value".to_string()))
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatTurnRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let turn = body.validate()?;
    let chat_id_value = chat_id_header(&turn.chat_id)?;

    let cancel = CancellationToken::new();
    let response = state
        .orchestrator
        .handle_turn(turn, cancel.clone())
        .await?;

    match response {
        TurnResponse::Author { message, .. } => Ok((
            StatusCode::OK,
            [(CHAT_ID_HEADER, chat_id_value)],
            Json(json!({
                "message": { "role": message.role, "content": message.content }
            })),
        )
            .into_response()),
        TurnResponse::Stream {
            chat_id,
            mut events,
        } => {
            // Dropping the guard cancels the turn, both here on early return
            // and when the client abandons the body.
            let guard = cancel.drop_guard();
            let first = match events.next().await {
                Some(Ok(event)) => event,
                Some(Err(e)) => return Err(e.into()),
                None => {
                    debug!(chat_id = %chat_id, "turn ended without output");
                    return Ok((
                        StatusCode::OK,
                        [
                            (header::CONTENT_TYPE, HeaderValue::from_static(DATA_STREAM_CONTENT_TYPE)),
                        ],
                        [(CHAT_ID_HEADER, chat_id_value)],
                        "",
                    )
                        .into_response());
                }
            };

            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static(DATA_STREAM_CONTENT_TYPE)),
                    (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
                ],
                [
                    (CHAT_ID_HEADER, chat_id_value),
                    ("x-vercel-ai-data-stream", HeaderValue::from_static("v1")),
                ],
                data_stream_body(first, events, guard),
            )
                .into_response())
        }
    }
}
