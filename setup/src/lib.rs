pub mod app;
pub mod pipeline_loader;

pub use app::{build_and_run, Application};
pub use pipeline_loader::{PipelinePluginLoader, PipelineStepPlugin};
