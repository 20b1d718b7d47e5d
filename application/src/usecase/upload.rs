use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use docqa_domain::{Document, DocumentRepository, IngestContext, WORD_COUNT_EXTENSION};

use crate::{
    ApplicationError, DocumentListResponse, DocumentPayload, IngestionPipeline,
    UploadDocsRequest, UploadDocsResponse, UploadedDocument,
};

#[async_trait]
pub trait UploadDocsUseCase: Send + Sync {
    async fn upload(
        &self,
        request: UploadDocsRequest,
    ) -> Result<UploadDocsResponse, ApplicationError>;

    async fn list(&self) -> Result<DocumentListResponse, ApplicationError>;

    async fn clear(&self) -> Result<DocumentListResponse, ApplicationError>;
}

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_documents_per_request: usize,
    pub max_document_bytes: usize,
}

pub struct UploadDocsUseCaseImpl {
    pipeline: IngestionPipeline,
    repository: Arc<dyn DocumentRepository>,
    limits: UploadLimits,
}

impl UploadDocsUseCaseImpl {
    pub fn new(
        pipeline: IngestionPipeline,
        repository: Arc<dyn DocumentRepository>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            pipeline,
            repository,
            limits,
        }
    }

    fn check_batch(&self, documents: &[DocumentPayload]) -> Result<(), ApplicationError> {
        if documents.len() > self.limits.max_documents_per_request {
            return Err(ApplicationError::Validation(format!(
                "at most {} documents can be uploaded per request, got {}",
                self.limits.max_documents_per_request,
                documents.len()
            )));
        }
        for (idx, payload) in documents.iter().enumerate() {
            if payload.content.trim().is_empty() {
                return Err(ApplicationError::Validation(format!(
                    "document {} has no content",
                    idx + 1
                )));
            }
            if payload.content.len() > self.limits.max_document_bytes {
                return Err(ApplicationError::Validation(format!(
                    "document {} is {} bytes, limit is {}",
                    idx + 1,
                    payload.content.len(),
                    self.limits.max_document_bytes
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UploadDocsUseCase for UploadDocsUseCaseImpl {
    async fn upload(
        &self,
        request: UploadDocsRequest,
    ) -> Result<UploadDocsResponse, ApplicationError> {
        let UploadDocsRequest { documents } = request;
        let batch_id = Uuid::new_v4().to_string();
        tracing::debug!(
            batch_id = %batch_id,
            document_count = documents.len(),
            "starting document upload"
        );
        self.check_batch(&documents)?;

        // Run every document through the pipeline before storing any of them so
        // that a failing document leaves the index untouched.
        let mut prepared = Vec::with_capacity(documents.len());
        for (idx, payload) in documents.into_iter().enumerate() {
            let DocumentPayload {
                title,
                source,
                content,
            } = payload;
            let title = title
                .or_else(|| source.clone())
                .unwrap_or_else(|| format!("document-{}", idx + 1));
            let mut context = IngestContext::new(&batch_id, Document::new(title, source, content));
            self.pipeline.run(&mut context).await?;
            if context.chunks.is_empty() {
                return Err(ApplicationError::Validation(format!(
                    "document `{}` produced no indexable text",
                    context.document.title
                )));
            }
            prepared.push(context);
        }

        let mut uploaded = Vec::with_capacity(prepared.len());
        let mut chunks_indexed = 0;
        for context in prepared {
            let word_count = context
                .extension(WORD_COUNT_EXTENSION)
                .and_then(|value| value.as_u64());
            let IngestContext {
                document, chunks, ..
            } = context;
            chunks_indexed += chunks.len();
            tracing::debug!(
                batch_id = %batch_id,
                document_id = %document.id,
                chunk_count = chunks.len(),
                word_count = ?word_count,
                "document prepared for indexing"
            );
            uploaded.push(UploadedDocument {
                id: document.id,
                title: document.title.clone(),
                chunk_count: chunks.len(),
                word_count,
            });
            self.repository.save(document, chunks).await?;
        }

        let response = UploadDocsResponse {
            batch_id,
            uploaded: uploaded.len(),
            chunks_indexed,
            total_documents: self.repository.count().await?,
            documents: uploaded,
        };

        tracing::debug!(
            batch_id = %response.batch_id,
            uploaded = response.uploaded,
            chunks_indexed = response.chunks_indexed,
            "document upload completed"
        );

        Ok(response)
    }

    async fn list(&self) -> Result<DocumentListResponse, ApplicationError> {
        let documents = self.repository.list().await?;
        Ok(DocumentListResponse {
            total_documents: documents.len(),
            documents,
        })
    }

    async fn clear(&self) -> Result<DocumentListResponse, ApplicationError> {
        self.repository.clear().await?;
        tracing::debug!("document store cleared");
        self.list().await
    }
}
