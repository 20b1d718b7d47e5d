pub mod ask;
pub mod docs;
pub mod health;

pub use ask::ask_question;
pub use docs::{clear_docs, list_docs, upload_docs};
pub use health::health_check;
