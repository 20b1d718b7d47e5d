use std::sync::Arc;

use docqa_domain::{DomainError, IngestContext, IngestStage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStepSpec {
    pub name: String,
}

impl PipelineStepSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineDefinition {
    pub steps: Vec<PipelineStepSpec>,
}

impl PipelineDefinition {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: names.into_iter().map(PipelineStepSpec::new).collect(),
        }
    }
}

pub trait PipelineStepLoader: Send + Sync {
    fn load_step(&self, step: &PipelineStepSpec) -> Result<Arc<dyn IngestStage>, DomainError>;
}

#[derive(Default)]
pub struct IngestionPipeline {
    stages: Vec<Arc<dyn IngestStage>>,
}

impl IngestionPipeline {
    pub fn new(stages: Vec<Arc<dyn IngestStage>>) -> Self {
        Self { stages }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn from_definition(
        definition: &PipelineDefinition,
        loader: &dyn PipelineStepLoader,
    ) -> Result<Self, DomainError> {
        let mut stages = Vec::with_capacity(definition.steps.len());
        for step in &definition.steps {
            stages.push(loader.load_step(step)?);
        }
        Ok(Self::new(stages))
    }

    pub async fn run(&self, context: &mut IngestContext) -> Result<(), DomainError> {
        for stage in &self.stages {
            tracing::debug!(
                stage = stage.name(),
                document_id = %context.document.id,
                "executing ingest stage"
            );
            stage.execute(context).await?;
        }
        Ok(())
    }
}
