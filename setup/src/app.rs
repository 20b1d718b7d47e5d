use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Error};
use axum::Router;
use docqa_application::{
    AskSettings, AskUseCase, AskUseCaseImpl, UploadDocsUseCase, UploadDocsUseCaseImpl,
    UploadLimits,
};
use docqa_configuration::{AppConfig, ServerConfig};
use docqa_domain::AnswerPort;
use docqa_http_server::{create_app_routes, AppState};
use docqa_infra::{ExtractiveAnswerer, InMemoryDocumentIndex, OpenAiAnswerer, OpenAiAnswererConfig};
use tokio::net::TcpListener;

use crate::pipeline_loader::PipelinePluginLoader;

pub async fn build_and_run(config: AppConfig, server_config: ServerConfig) -> Result<(), Error> {
    let app = Application::new(config).await?;
    app.run(server_config).await
}

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self, Error> {
        config.validate()?;
        tracing::info!(
            chunk_size_words = config.service.ingestion.chunk_size_words,
            chunk_overlap_words = config.service.ingestion.chunk_overlap_words,
            answer_provider = %config.service.answer.provider,
            default_top_k = config.service.retrieval.default_top_k,
            "initializing docqa application"
        );

        let pipeline = PipelinePluginLoader::new(config.clone()).build_pipeline()?;
        tracing::debug!(stages = ?pipeline.stage_names(), "ingestion pipeline ready");

        let index = Arc::new(InMemoryDocumentIndex::new());
        let answerer = build_answerer(&config, |key| std::env::var(key).ok())?;

        let upload: Arc<dyn UploadDocsUseCase> = Arc::new(UploadDocsUseCaseImpl::new(
            pipeline,
            index.clone(),
            UploadLimits {
                max_documents_per_request: config.service.ingestion.max_documents_per_request,
                max_document_bytes: config.service.ingestion.max_document_bytes,
            },
        ));
        let ask: Arc<dyn AskUseCase> = Arc::new(AskUseCaseImpl::new(
            index.clone(),
            index,
            answerer,
            AskSettings {
                default_top_k: config.service.retrieval.default_top_k,
                max_top_k: config.service.retrieval.max_top_k,
                min_score: config.service.retrieval.min_score,
            },
        ));
        let state = AppState::new(upload, ask);

        Ok(Self { config, state })
    }

    pub fn router(&self) -> Router {
        create_app_routes(self.state.clone(), &self.config.server)
    }

    pub async fn run(self, server_config: ServerConfig) -> Result<(), Error> {
        let address = format!("{}:{}", server_config.host, server_config.port);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|err| anyhow!("failed to bind {address}: {err}"))?;
        self.serve(listener).await
    }

    pub async fn serve(self, listener: TcpListener) -> Result<(), Error> {
        let local_addr = listener.local_addr()?;
        tracing::info!(address = %local_addr, "starting docqa HTTP routes");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|err| anyhow!("server error: {err}"))
    }
}

fn build_answerer<F>(config: &AppConfig, lookup: F) -> Result<Arc<dyn AnswerPort>, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let answer = &config.service.answer;
    match answer.provider.as_str() {
        "extractive" => Ok(Arc::new(ExtractiveAnswerer::new(answer.max_sentences))),
        "openai" => {
            let openai = &answer.openai;
            let api_key = lookup(&openai.api_key_env)
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    anyhow!(
                        "answer provider `openai` requires the `{}` environment variable",
                        openai.api_key_env
                    )
                })?;
            let answerer = OpenAiAnswerer::new(OpenAiAnswererConfig {
                base_url: openai.base_url.clone(),
                model: openai.model.clone(),
                api_key,
                timeout: Duration::from_millis(openai.timeout_ms),
                temperature: openai.temperature,
                max_tokens: openai.max_tokens,
            })?;
            tracing::info!(model = %openai.model, base_url = %openai.base_url, "using OpenAI-compatible answerer");
            Ok(Arc::new(answerer))
        }
        other => Err(anyhow!("unknown answer provider `{other}`")),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
