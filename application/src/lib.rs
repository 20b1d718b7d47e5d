pub mod dto;
pub mod error;
pub mod pipeline;
pub mod usecase;

pub use dto::*;
pub use error::*;
pub use pipeline::{IngestionPipeline, PipelineDefinition, PipelineStepLoader, PipelineStepSpec};
pub use usecase::{
    AskSettings, AskUseCase, AskUseCaseImpl, UploadDocsUseCase, UploadDocsUseCaseImpl,
    UploadLimits,
};
