pub mod ask;
pub mod upload;

pub use ask::{AskSettings, AskUseCase, AskUseCaseImpl};
pub use upload::{UploadDocsUseCase, UploadDocsUseCaseImpl, UploadLimits};
