use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use docqa_domain::{
    tokenize, Chunk, Document, DocumentRepository, DocumentSummary, DomainError, RetrievalPort,
    ScoredChunk, SearchQuery,
};
use tokio::sync::RwLock;

const BM25_K1: f32 = 1.2;
const BM25_B: f32 = 0.75;

struct StoredDocument {
    document: Document,
    chunk_count: usize,
}

struct IndexedChunk {
    chunk: Chunk,
    document_ord: usize,
    term_count: usize,
}

#[derive(Default)]
struct IndexState {
    documents: Vec<StoredDocument>,
    chunks: Vec<IndexedChunk>,
    postings: HashMap<String, Vec<(usize, u32)>>,
    total_terms: usize,
}

impl IndexState {
    fn insert(&mut self, document: Document, chunks: Vec<Chunk>) {
        let document_ord = self.documents.len();
        let chunk_count = chunks.len();

        for chunk in chunks {
            let chunk_ord = self.chunks.len();
            let terms = tokenize(&chunk.text);
            let mut frequencies: HashMap<String, u32> = HashMap::new();
            for term in &terms {
                *frequencies.entry(term.clone()).or_default() += 1;
            }
            for (term, tf) in frequencies {
                self.postings.entry(term).or_default().push((chunk_ord, tf));
            }
            self.total_terms += terms.len();
            self.chunks.push(IndexedChunk {
                chunk,
                document_ord,
                term_count: terms.len(),
            });
        }

        self.documents.push(StoredDocument {
            document,
            chunk_count,
        });
    }

    fn score(&self, query: &str) -> HashMap<usize, f32> {
        let mut scores = HashMap::new();
        let chunk_total = self.chunks.len();
        if chunk_total == 0 {
            return scores;
        }
        let avg_len = (self.total_terms as f32 / chunk_total as f32).max(1.0);
        let terms: BTreeSet<String> = tokenize(query).into_iter().collect();

        for term in &terms {
            let Some(postings) = self.postings.get(term) else {
                continue;
            };
            let df = postings.len() as f32;
            let idf = (1.0 + (chunk_total as f32 - df + 0.5) / (df + 0.5)).ln();
            for &(chunk_ord, tf) in postings {
                let tf = tf as f32;
                let len = self.chunks[chunk_ord].term_count as f32;
                let norm = BM25_K1 * (1.0 - BM25_B + BM25_B * len / avg_len);
                *scores.entry(chunk_ord).or_insert(0.0) += idf * tf * (BM25_K1 + 1.0) / (tf + norm);
            }
        }
        scores
    }
}

/// Document store and BM25 retriever over the same in-memory chunk index.
#[derive(Default)]
pub struct InMemoryDocumentIndex {
    state: RwLock<IndexState>,
}

impl InMemoryDocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentIndex {
    async fn save(&self, document: Document, chunks: Vec<Chunk>) -> Result<(), DomainError> {
        if chunks.iter().any(|chunk| chunk.document_id != document.id) {
            return Err(DomainError::invalid_input(
                "chunk does not belong to the saved document",
            ));
        }
        let mut state = self.state.write().await;
        tracing::debug!(
            document_id = %document.id,
            chunk_count = chunks.len(),
            "indexing document"
        );
        state.insert(document, chunks);
        Ok(())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.state.read().await.documents.len())
    }

    async fn list(&self) -> Result<Vec<DocumentSummary>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .documents
            .iter()
            .map(|stored| DocumentSummary {
                id: stored.document.id,
                title: stored.document.title.clone(),
                source: stored.document.source.clone(),
                chunk_count: stored.chunk_count,
            })
            .collect())
    }

    async fn clear(&self) -> Result<(), DomainError> {
        *self.state.write().await = IndexState::default();
        Ok(())
    }
}

#[async_trait]
impl RetrievalPort for InMemoryDocumentIndex {
    async fn search(&self, query: SearchQuery) -> Result<Vec<ScoredChunk>, DomainError> {
        if query.top_k == 0 {
            return Ok(Vec::new());
        }
        let state = self.state.read().await;
        let mut ranked: Vec<(usize, f32)> = state
            .score(&query.text)
            .into_iter()
            .filter(|(_, score)| *score > 0.0 && *score >= query.min_score)
            .collect();

        ranked.sort_by(|(left_ord, left_score), (right_ord, right_score)| {
            right_score
                .partial_cmp(left_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    let left = &state.chunks[*left_ord];
                    let right = &state.chunks[*right_ord];
                    (left.document_ord, left.chunk.index)
                        .cmp(&(right.document_ord, right.chunk.index))
                })
        });
        ranked.truncate(query.top_k);

        Ok(ranked
            .into_iter()
            .map(|(chunk_ord, score)| {
                let indexed = &state.chunks[chunk_ord];
                ScoredChunk {
                    chunk: indexed.chunk.clone(),
                    document_title: state.documents[indexed.document_ord]
                        .document
                        .title
                        .clone(),
                    score,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(title: &str, passages: &[&str]) -> (Document, Vec<Chunk>) {
        let document = Document::new(title, None, passages.join(" "));
        let chunks = passages
            .iter()
            .enumerate()
            .map(|(index, text)| Chunk {
                document_id: document.id,
                index,
                text: text.to_string(),
            })
            .collect();
        (document, chunks)
    }

    fn query(text: &str, top_k: usize) -> SearchQuery {
        SearchQuery {
            text: text.to_string(),
            top_k,
            min_score: 0.0,
        }
    }

    async fn seeded() -> InMemoryDocumentIndex {
        let index = InMemoryDocumentIndex::new();
        let (doc, chunks) = document(
            "policies",
            &[
                "Refunds are granted within thirty days of purchase.",
                "Shipping is free for orders above fifty euros.",
            ],
        );
        index.save(doc, chunks).await.unwrap();
        let (doc, chunks) = document(
            "faq",
            &["Orders ship within two days.", "Support answers email daily."],
        );
        index.save(doc, chunks).await.unwrap();
        index
    }

    #[tokio::test]
    async fn best_matching_chunk_ranks_first() {
        let index = seeded().await;

        let hits = index.search(query("how do refunds work", 3)).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document_title, "policies");
        assert!(hits[0].chunk.text.starts_with("Refunds"));
        assert!(hits[0].score > 0.0);
    }

    #[tokio::test]
    async fn rarer_terms_weigh_more() {
        let index = seeded().await;

        let hits = index.search(query("orders shipping", 5)).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert!(hits[0].chunk.text.contains("Shipping"));
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn top_k_and_min_score_limit_results() {
        let index = seeded().await;

        let limited = index.search(query("orders shipping", 1)).await.unwrap();
        assert_eq!(limited.len(), 1);

        let strict = index
            .search(SearchQuery {
                text: "orders shipping".to_string(),
                top_k: 5,
                min_score: 1_000.0,
            })
            .await
            .unwrap();
        assert!(strict.is_empty());
    }

    #[tokio::test]
    async fn equal_scores_keep_insertion_order() {
        let index = InMemoryDocumentIndex::new();
        let (first, first_chunks) = document("first", &["identical passage text"]);
        let (second, second_chunks) = document("second", &["identical passage text"]);
        index.save(first, first_chunks).await.unwrap();
        index.save(second, second_chunks).await.unwrap();

        let hits = index.search(query("passage", 2)).await.unwrap();

        let titles: Vec<&str> = hits.iter().map(|hit| hit.document_title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn stop_word_queries_match_nothing() {
        let index = seeded().await;
        assert!(index.search(query("what is the", 3)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repository_lists_and_clears_documents() {
        let index = seeded().await;

        let listing = index.list().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 2);
        assert_eq!(listing[0].title, "policies");
        assert_eq!(listing[1].chunk_count, 2);

        index.clear().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
        assert!(index.search(query("refunds", 3)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_chunks_are_rejected() {
        let index = InMemoryDocumentIndex::new();
        let (doc, _) = document("a", &["text"]);
        let (_, other_chunks) = document("b", &["text"]);

        assert!(index.save(doc, other_chunks).await.is_err());
    }
}
