use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use docqa_application::{
    IngestionPipeline, PipelineDefinition, PipelineStepLoader, PipelineStepSpec,
};
use docqa_configuration::{AppConfig, PipelineStepRef};
use docqa_domain::{DomainError, IngestStage};
use docqa_infra::{ChunkTextStage, DedupChunksStage, NormalizeTextStage};

pub trait PipelineStepPlugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn build(&self, config: &AppConfig) -> Result<Arc<dyn IngestStage>>;
}

pub struct PipelinePluginLoader {
    config: AppConfig,
    plugins: HashMap<String, Arc<dyn PipelineStepPlugin>>,
}

impl PipelinePluginLoader {
    pub fn new(config: AppConfig) -> Self {
        let mut loader = Self {
            config,
            plugins: HashMap::new(),
        };
        loader.register_builtin_plugins();
        loader
    }

    pub fn register_plugin(&mut self, plugin: Arc<dyn PipelineStepPlugin>) {
        self.plugins.insert(plugin.name().to_string(), plugin);
    }

    pub fn build_pipeline(&self) -> Result<IngestionPipeline> {
        let definition = to_runtime_definition(&self.config.service.ingestion.pipeline)?;
        IngestionPipeline::from_definition(&definition, self)
            .map_err(|err| anyhow!("failed to build ingestion pipeline: {err}"))
    }

    fn register_builtin_plugins(&mut self) {
        self.register_plugin(Arc::new(NormalizeTextPlugin));
        self.register_plugin(Arc::new(ChunkTextPlugin));
        self.register_plugin(Arc::new(DedupChunksPlugin));
    }
}

impl PipelineStepLoader for PipelinePluginLoader {
    fn load_step(&self, step: &PipelineStepSpec) -> Result<Arc<dyn IngestStage>, DomainError> {
        let plugin = self.plugins.get(step.name.as_str()).ok_or_else(|| {
            DomainError::internal_error(&format!("unknown pipeline step plugin `{}`", step.name))
        })?;

        plugin.build(&self.config).map_err(|err| {
            DomainError::internal_error(&format!(
                "failed to build pipeline step `{}`: {err}",
                step.name
            ))
        })
    }
}

fn to_runtime_definition(steps: &[PipelineStepRef]) -> Result<PipelineDefinition> {
    if steps.is_empty() {
        return Err(anyhow!("`service.ingestion.pipeline` cannot be empty"));
    }
    let names = steps
        .iter()
        .map(|step| {
            let name = step.name().trim();
            if name.is_empty() {
                return Err(anyhow!("pipeline step name cannot be empty"));
            }
            Ok(name.to_string())
        })
        .collect::<Result<Vec<_>>>()?;
    if !names.iter().any(|name| name == "chunk_text") {
        return Err(anyhow!(
            "`service.ingestion.pipeline` must contain the `chunk_text` step"
        ));
    }
    Ok(PipelineDefinition::from_names(names))
}

struct NormalizeTextPlugin;

impl PipelineStepPlugin for NormalizeTextPlugin {
    fn name(&self) -> &'static str {
        "normalize_text"
    }

    fn build(&self, _config: &AppConfig) -> Result<Arc<dyn IngestStage>> {
        Ok(Arc::new(NormalizeTextStage::new()))
    }
}

struct ChunkTextPlugin;

impl PipelineStepPlugin for ChunkTextPlugin {
    fn name(&self) -> &'static str {
        "chunk_text"
    }

    fn build(&self, config: &AppConfig) -> Result<Arc<dyn IngestStage>> {
        let ingestion = &config.service.ingestion;
        let stage = ChunkTextStage::new(ingestion.chunk_size_words, ingestion.chunk_overlap_words)?;
        Ok(Arc::new(stage))
    }
}

struct DedupChunksPlugin;

impl PipelineStepPlugin for DedupChunksPlugin {
    fn name(&self) -> &'static str {
        "dedup_chunks"
    }

    fn build(&self, _config: &AppConfig) -> Result<Arc<dyn IngestStage>> {
        Ok(Arc::new(DedupChunksStage::new()))
    }
}
