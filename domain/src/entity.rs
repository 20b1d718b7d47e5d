use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub source: Option<String>,
    pub content: String,
    pub byte_len: usize,
}

impl Document {
    pub fn new(title: impl Into<String>, source: Option<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            source,
            byte_len: content.len(),
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub document_id: Uuid,
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub title: String,
    pub source: Option<String>,
    pub chunk_count: usize,
}

/// Extension key under which chunking records the document's word count.
pub const WORD_COUNT_EXTENSION: &str = "ingest.word_count";

/// Mutable state handed from one ingestion stage to the next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestContext {
    pub batch_id: String,
    pub document: Document,
    pub chunks: Vec<Chunk>,
    pub extensions: HashMap<String, Value>,
}

impl IngestContext {
    pub fn new(batch_id: impl Into<String>, document: Document) -> Self {
        Self {
            batch_id: batch_id.into(),
            document,
            chunks: Vec::new(),
            extensions: HashMap::new(),
        }
    }

    pub fn set_extension(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.extensions.insert(key.into(), value)
    }

    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub document_title: String,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub top_k: usize,
    pub min_score: f32,
}

#[derive(Debug, Clone)]
pub struct AnswerRequest {
    pub question: String,
    pub passages: Vec<ScoredChunk>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub model: String,
}
