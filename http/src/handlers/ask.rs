use axum::{extract::State, http::StatusCode, response::Json};

use docqa_application::{AskRequest, AskResponse};

use crate::error::{error_mapper, HttpError};
use crate::extract::ValidatedJson;
use crate::AppState;

pub async fn ask_question(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<AskRequest>,
) -> Result<(StatusCode, Json<AskResponse>), HttpError> {
    tracing::info!(
        question_len = request.question.as_deref().map_or(0, str::len),
        top_k = request.top_k.unwrap_or(0),
        "received ask request"
    );

    match state.ask.ask(request).await {
        Ok(result) => {
            tracing::info!(
                status = ?result.status,
                citation_count = result.citations.len(),
                "ask request completed"
            );
            Ok((StatusCode::OK, Json(result)))
        }
        Err(error) => {
            tracing::error!(error = %error, "ask request failed");
            Err(error_mapper(error))
        }
    }
}
