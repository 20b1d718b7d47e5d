use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use docqa_domain::ScoredChunk;

const EXCERPT_MAX_CHARS: usize = 240;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(max = 4096))]
    pub question: Option<String>,
    #[validate(range(min = 1, max = 50))]
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AskStatus {
    Answered,
    NoQuestion,
    NoDocuments,
    NoMatch,
}

#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    pub document_id: Uuid,
    pub title: String,
    pub chunk_index: usize,
    pub score: f32,
    pub excerpt: String,
}

impl From<&ScoredChunk> for Citation {
    fn from(hit: &ScoredChunk) -> Self {
        Self {
            document_id: hit.chunk.document_id,
            title: hit.document_title.clone(),
            chunk_index: hit.chunk.index,
            score: hit.score,
            excerpt: excerpt(&hit.chunk.text),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub question: Option<String>,
    pub status: AskStatus,
    pub answer: Option<String>,
    pub model: Option<String>,
    pub citations: Vec<Citation>,
}

impl AskResponse {
    pub fn unanswered(question: Option<String>, status: AskStatus) -> Self {
        Self {
            question,
            status,
            answer: None,
            model: None,
            citations: Vec::new(),
        }
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_MAX_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(EXCERPT_MAX_CHARS - 3).collect();
    format!("{}...", cut.trim_end())
}
