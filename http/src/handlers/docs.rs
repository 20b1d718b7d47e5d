use axum::{extract::State, http::StatusCode, response::Json};

use docqa_application::{DocumentListResponse, UploadDocsResponse};

use crate::error::{error_mapper, HttpError};
use crate::extract::UploadPayload;
use crate::AppState;

pub async fn upload_docs(
    State(state): State<AppState>,
    UploadPayload(request): UploadPayload,
) -> Result<(StatusCode, Json<UploadDocsResponse>), HttpError> {
    tracing::info!(
        document_count = request.documents.len(),
        total_bytes = request
            .documents
            .iter()
            .map(|document| document.content.len())
            .sum::<usize>(),
        "received upload request"
    );

    match state.upload.upload(request).await {
        Ok(result) => {
            tracing::info!(
                batch_id = %result.batch_id,
                uploaded = result.uploaded,
                chunks_indexed = result.chunks_indexed,
                "upload request completed"
            );
            Ok((StatusCode::OK, Json(result)))
        }
        Err(error) => {
            tracing::error!(error = %error, "upload request failed");
            Err(error_mapper(error))
        }
    }
}

pub async fn list_docs(
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>, HttpError> {
    let listing = state.upload.list().await?;
    Ok(Json(listing))
}

pub async fn clear_docs(
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>, HttpError> {
    tracing::info!("received clear documents request");
    let listing = state.upload.clear().await?;
    Ok(Json(listing))
}
