use std::cmp::Ordering;
use std::collections::HashSet;

use async_trait::async_trait;
use docqa_domain::{split_sentences, tokenize, Answer, AnswerPort, AnswerRequest, DomainError};

pub const EXTRACTIVE_MODEL: &str = "extractive";

/// Answers by quoting the passage sentences that share the most terms with the question.
pub struct ExtractiveAnswerer {
    max_sentences: usize,
}

impl ExtractiveAnswerer {
    pub fn new(max_sentences: usize) -> Self {
        Self {
            max_sentences: max_sentences.max(1),
        }
    }
}

struct Candidate<'a> {
    text: &'a str,
    position: (usize, usize),
    score: f32,
}

#[async_trait]
impl AnswerPort for ExtractiveAnswerer {
    async fn answer(&self, request: AnswerRequest) -> Result<Answer, DomainError> {
        let Some(best) = request.passages.first() else {
            return Err(DomainError::invalid_input("no passages to answer from"));
        };
        let question_terms: HashSet<String> = tokenize(&request.question).into_iter().collect();

        let mut candidates = Vec::new();
        for (passage_idx, passage) in request.passages.iter().enumerate() {
            for (sentence_idx, sentence) in split_sentences(&passage.chunk.text).into_iter().enumerate() {
                let overlap = tokenize(sentence)
                    .into_iter()
                    .collect::<HashSet<_>>()
                    .intersection(&question_terms)
                    .count();
                if overlap == 0 {
                    continue;
                }
                candidates.push(Candidate {
                    text: sentence,
                    position: (passage_idx, sentence_idx),
                    score: overlap as f32 * (1.0 + passage.score.max(0.0)),
                });
            }
        }

        candidates.sort_by(|left, right| {
            right
                .score
                .partial_cmp(&left.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| left.position.cmp(&right.position))
        });

        // Overlapping chunks repeat sentences.
        let mut seen = HashSet::new();
        let mut selected: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| seen.insert(candidate.text.to_lowercase()))
            .take(self.max_sentences)
            .collect();
        selected.sort_by_key(|candidate| candidate.position);

        let text = if selected.is_empty() {
            split_sentences(&best.chunk.text)
                .first()
                .map(|sentence| sentence.to_string())
                .unwrap_or_else(|| best.chunk.text.trim().to_string())
        } else {
            selected
                .iter()
                .map(|candidate| candidate.text)
                .collect::<Vec<_>>()
                .join(" ")
        };

        Ok(Answer {
            text,
            model: EXTRACTIVE_MODEL.to_string(),
        })
    }
}
