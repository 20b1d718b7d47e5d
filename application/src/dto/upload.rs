use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use docqa_domain::DocumentSummary;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UploadDocsRequest {
    #[serde(default)]
    #[validate(nested)]
    pub documents: Vec<DocumentPayload>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DocumentPayload {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 1024))]
    pub source: Option<String>,
    #[validate(length(min = 1))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadedDocument {
    pub id: Uuid,
    pub title: String,
    pub chunk_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadDocsResponse {
    pub batch_id: String,
    pub uploaded: usize,
    pub chunks_indexed: usize,
    pub total_documents: usize,
    pub documents: Vec<UploadedDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentListResponse {
    pub total_documents: usize,
    pub documents: Vec<DocumentSummary>,
}
