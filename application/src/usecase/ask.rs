use std::sync::Arc;

use async_trait::async_trait;

use docqa_domain::{AnswerPort, AnswerRequest, DocumentRepository, RetrievalPort, SearchQuery};

use crate::{ApplicationError, AskRequest, AskResponse, AskStatus, Citation};

#[async_trait]
pub trait AskUseCase: Send + Sync {
    async fn ask(&self, request: AskRequest) -> Result<AskResponse, ApplicationError>;
}

#[derive(Debug, Clone, Copy)]
pub struct AskSettings {
    pub default_top_k: usize,
    pub max_top_k: usize,
    pub min_score: f32,
}

pub struct AskUseCaseImpl {
    repository: Arc<dyn DocumentRepository>,
    retrieval: Arc<dyn RetrievalPort>,
    answerer: Arc<dyn AnswerPort>,
    settings: AskSettings,
}

impl AskUseCaseImpl {
    pub fn new(
        repository: Arc<dyn DocumentRepository>,
        retrieval: Arc<dyn RetrievalPort>,
        answerer: Arc<dyn AnswerPort>,
        settings: AskSettings,
    ) -> Self {
        Self {
            repository,
            retrieval,
            answerer,
            settings,
        }
    }

    fn top_k(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.settings.default_top_k)
            .clamp(1, self.settings.max_top_k.max(1))
    }
}

#[async_trait]
impl AskUseCase for AskUseCaseImpl {
    async fn ask(&self, request: AskRequest) -> Result<AskResponse, ApplicationError> {
        let question = request
            .question
            .map(|question| question.trim().to_string())
            .filter(|question| !question.is_empty());
        let Some(question) = question else {
            tracing::debug!("ask request carried no question");
            return Ok(AskResponse::unanswered(None, AskStatus::NoQuestion));
        };

        if self.repository.count().await? == 0 {
            tracing::debug!("ask request received before any document was uploaded");
            return Ok(AskResponse::unanswered(
                Some(question),
                AskStatus::NoDocuments,
            ));
        }

        let top_k = self.top_k(request.top_k);
        tracing::debug!(top_k, question_len = question.len(), "searching documents");
        let hits = self
            .retrieval
            .search(SearchQuery {
                text: question.clone(),
                top_k,
                min_score: self.settings.min_score,
            })
            .await?;
        if hits.is_empty() {
            return Ok(AskResponse::unanswered(Some(question), AskStatus::NoMatch));
        }

        let citations = hits.iter().map(Citation::from).collect::<Vec<_>>();
        let answer = self
            .answerer
            .answer(AnswerRequest {
                question: question.clone(),
                passages: hits,
            })
            .await?;

        tracing::debug!(
            citation_count = citations.len(),
            model = %answer.model,
            "question answered"
        );

        Ok(AskResponse {
            question: Some(question),
            status: AskStatus::Answered,
            answer: Some(answer.text),
            model: Some(answer.model),
            citations,
        })
    }
}
