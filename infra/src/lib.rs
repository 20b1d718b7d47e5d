pub mod answer;
pub mod index;
pub mod openai;
pub mod text;

pub use answer::ExtractiveAnswerer;
pub use index::InMemoryDocumentIndex;
pub use openai::{OpenAiAnswerer, OpenAiAnswererConfig};
pub use text::{ChunkTextStage, DedupChunksStage, NormalizeTextStage};
