//! Chat endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{AnswerResult, ChatRequest};

/// POST /api/v1/chat - Answer a question from the study materials
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<AnswerResult>> {
    tracing::info!("Chat question: \"{}\"", request.question);
    let result = state.engine().answer(&request).await?;
    tracing::info!(
        "Answered in {:.2}s with {} sources",
        result.response_time,
        result.sources.len()
    );
    Ok(Json(result))
}
