use async_trait::async_trait;

use crate::{
    Answer, AnswerRequest, Chunk, Document, DocumentSummary, DomainError, IngestContext,
    ScoredChunk, SearchQuery,
};

#[async_trait]
pub trait IngestStage: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, context: &mut IngestContext) -> Result<(), DomainError>;
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn save(&self, document: Document, chunks: Vec<Chunk>) -> Result<(), DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
    async fn list(&self) -> Result<Vec<DocumentSummary>, DomainError>;
    async fn clear(&self) -> Result<(), DomainError>;
}

#[async_trait]
pub trait RetrievalPort: Send + Sync {
    async fn search(&self, query: SearchQuery) -> Result<Vec<ScoredChunk>, DomainError>;
}

#[async_trait]
pub trait AnswerPort: Send + Sync {
    async fn answer(&self, request: AnswerRequest) -> Result<Answer, DomainError>;
}
