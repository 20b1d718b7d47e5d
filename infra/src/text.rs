use std::collections::HashSet;

use async_trait::async_trait;
use docqa_domain::{Chunk, DomainError, IngestContext, IngestStage, WORD_COUNT_EXTENSION};
use serde_json::json;

pub struct NormalizeTextStage;

impl NormalizeTextStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NormalizeTextStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IngestStage for NormalizeTextStage {
    fn name(&self) -> &'static str {
        "normalize_text"
    }

    async fn execute(&self, context: &mut IngestContext) -> Result<(), DomainError> {
        let normalized = normalize(&context.document.content);
        context.set_extension(
            "ingest.normalized_bytes",
            json!(normalized.len()),
        );
        context.document.content = normalized;
        Ok(())
    }
}

fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    let mut newlines = 0usize;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' | '\n' => {
                newlines += 1;
                pending_space = false;
            }
            ' ' | '\t' => pending_space = true,
            c if c.is_control() => {}
            c if c.is_whitespace() => pending_space = true,
            c => {
                if !out.is_empty() {
                    match newlines {
                        0 if pending_space => out.push(' '),
                        0 => {}
                        1 => out.push('\n'),
                        _ => out.push_str("\n\n"),
                    }
                }
                newlines = 0;
                pending_space = false;
                out.push(c);
            }
        }
    }
    out
}

pub struct ChunkTextStage {
    chunk_size_words: usize,
    overlap_words: usize,
}

impl ChunkTextStage {
    pub fn new(chunk_size_words: usize, overlap_words: usize) -> Result<Self, DomainError> {
        if chunk_size_words == 0 {
            return Err(DomainError::invalid_input("chunk size must be greater than zero"));
        }
        if overlap_words >= chunk_size_words {
            return Err(DomainError::invalid_input(
                "chunk overlap must be smaller than chunk size",
            ));
        }
        Ok(Self {
            chunk_size_words,
            overlap_words,
        })
    }
}

#[async_trait]
impl IngestStage for ChunkTextStage {
    fn name(&self) -> &'static str {
        "chunk_text"
    }

    async fn execute(&self, context: &mut IngestContext) -> Result<(), DomainError> {
        let words: Vec<&str> = context.document.content.split_whitespace().collect();
        let step = self.chunk_size_words - self.overlap_words;
        let document_id = context.document.id;

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + self.chunk_size_words).min(words.len());
            chunks.push(Chunk {
                document_id,
                index: chunks.len(),
                text: words[start..end].join(" "),
            });
            if end == words.len() {
                break;
            }
            start += step;
        }

        tracing::debug!(
            document_id = %document_id,
            word_count = words.len(),
            chunk_count = chunks.len(),
            "document chunked"
        );
        context.set_extension(WORD_COUNT_EXTENSION, json!(words.len()));
        context.chunks = chunks;
        Ok(())
    }
}

pub struct DedupChunksStage;

impl DedupChunksStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DedupChunksStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IngestStage for DedupChunksStage {
    fn name(&self) -> &'static str {
        "dedup_chunks"
    }

    async fn execute(&self, context: &mut IngestContext) -> Result<(), DomainError> {
        let before = context.chunks.len();
        let mut seen = HashSet::new();
        context
            .chunks
            .retain(|chunk| seen.insert(chunk.text.to_lowercase()));
        for (index, chunk) in context.chunks.iter_mut().enumerate() {
            chunk.index = index;
        }
        context.set_extension(
            "ingest.duplicate_chunks",
            json!(before - context.chunks.len()),
        );
        Ok(())
    }
}
