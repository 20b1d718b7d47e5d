use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod logging;

pub use logging::setup_logging;

pub type AppConfig = DocQaConfig;

const ENV_PREFIX: &str = "DOCQA";
const SUPPORTED_PROVIDERS: &[&str] = &["extractive", "openai"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value `{value}` for environment variable `{key}`")]
    Env { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocQaConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    #[serde(default = "default_chunk_size_words")]
    pub chunk_size_words: usize,
    #[serde(default = "default_chunk_overlap_words")]
    pub chunk_overlap_words: usize,
    #[serde(default = "default_max_documents_per_request")]
    pub max_documents_per_request: usize,
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
    #[serde(default = "default_pipeline")]
    pub pipeline: Vec<PipelineStepRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineStepRef {
    Name(String),
    WithName { name: String },
}

impl PipelineStepRef {
    pub fn name(&self) -> &str {
        match self {
            PipelineStepRef::Name(name) => name,
            PipelineStepRef::WithName { name } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
    #[serde(default)]
    pub min_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_max_sentences")]
    pub max_sentences: usize,
    #[serde(default)]
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_openai_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            chunk_size_words: default_chunk_size_words(),
            chunk_overlap_words: default_chunk_overlap_words(),
            max_documents_per_request: default_max_documents_per_request(),
            max_document_bytes: default_max_document_bytes(),
            pipeline: default_pipeline(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            min_score: 0.0,
        }
    }
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            max_sentences: default_max_sentences(),
            openai: OpenAiConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            api_key_env: default_openai_api_key_env(),
            timeout_ms: default_openai_timeout_ms(),
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

impl DocQaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ingestion = &self.service.ingestion;
        if ingestion.chunk_size_words == 0 {
            return Err(ConfigError::Invalid(
                "`service.ingestion.chunk_size_words` must be greater than zero".to_string(),
            ));
        }
        if ingestion.chunk_overlap_words >= ingestion.chunk_size_words {
            return Err(ConfigError::Invalid(
                "`service.ingestion.chunk_overlap_words` must be smaller than `chunk_size_words`"
                    .to_string(),
            ));
        }
        if ingestion.pipeline.is_empty() {
            return Err(ConfigError::Invalid(
                "`service.ingestion.pipeline` cannot be empty".to_string(),
            ));
        }

        let retrieval = &self.service.retrieval;
        if retrieval.default_top_k == 0 || retrieval.max_top_k == 0 {
            return Err(ConfigError::Invalid(
                "retrieval top-k values must be greater than zero".to_string(),
            ));
        }
        if retrieval.default_top_k > retrieval.max_top_k {
            return Err(ConfigError::Invalid(
                "`service.retrieval.default_top_k` cannot exceed `max_top_k`".to_string(),
            ));
        }

        let provider = self.service.answer.provider.as_str();
        if !SUPPORTED_PROVIDERS.contains(&provider) {
            return Err(ConfigError::Invalid(format!(
                "unknown answer provider `{provider}`, expected one of {SUPPORTED_PROVIDERS:?}"
            )));
        }
        Ok(())
    }

    /// Applies `DOCQA_*` overrides; `lookup` resolves a variable name to its value.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |suffix: &str| format!("{ENV_PREFIX}_{suffix}");

        if let Some(host) = lookup(&key("SERVER__HOST")) {
            self.server.host = host;
        }
        if let Some(port) = lookup(&key("SERVER__PORT")) {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Env {
                key: key("SERVER__PORT"),
                value: port.clone(),
            })?;
        }
        if let Some(level) = lookup(&key("LOGGING__LEVEL")) {
            self.logging.level = level;
        }
        if let Some(format) = lookup(&key("LOGGING__FORMAT")) {
            self.logging.format = match format.trim().to_ascii_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::Env {
                        key: key("LOGGING__FORMAT"),
                        value: format,
                    })
                }
            };
        }
        if let Some(provider) = lookup(&key("SERVICE__ANSWER__PROVIDER")) {
            self.service.answer.provider = provider.trim().to_ascii_lowercase();
        }
        Ok(())
    }
}

/// Loads `default.toml` then `<run_env>.toml` from `dir`; missing files are skipped.
pub fn load_config_from_dir(dir: &Path, run_env: &str) -> Result<AppConfig, ConfigError> {
    let mut merged = toml::Table::new();
    for name in ["default", run_env] {
        let path = dir.join(format!("{name}.toml"));
        if !path.is_file() {
            continue;
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let table: toml::Table = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        merge_tables(&mut merged, table);
    }

    toml::Value::Table(merged)
        .try_into()
        .map_err(|err: toml::de::Error| ConfigError::Invalid(err.to_string()))
}

/// Full load: config files selected by `DOCQA_CONFIG_DIR` and `RUN_ENV`, then env overrides.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let dir = std::env::var(format!("{ENV_PREFIX}_CONFIG_DIR"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));
    let run_env = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".to_string());

    let mut config = load_config_from_dir(&dir, &run_env)?;
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            other => {
                base.insert(key, other);
            }
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_chunk_size_words() -> usize {
    200
}

fn default_chunk_overlap_words() -> usize {
    40
}

fn default_max_documents_per_request() -> usize {
    32
}

fn default_max_document_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_pipeline() -> Vec<PipelineStepRef> {
    ["normalize_text", "chunk_text", "dedup_chunks"]
        .into_iter()
        .map(|name| PipelineStepRef::Name(name.to_string()))
        .collect()
}

fn default_top_k() -> usize {
    4
}

fn default_max_top_k() -> usize {
    20
}

fn default_provider() -> String {
    "extractive".to_string()
}

fn default_max_sentences() -> usize {
    3
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_timeout_ms() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use super::*;

    #[test]
    fn config_defaults_are_deterministic() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.service.ingestion.chunk_size_words, 200);
        assert_eq!(cfg.service.retrieval.default_top_k, 4);
        assert_eq!(cfg.service.answer.provider, "extractive");
        assert_eq!(cfg.logging.format, LogFormat::Pretty);
        let steps: Vec<&str> = cfg
            .service
            .ingestion
            .pipeline
            .iter()
            .map(PipelineStepRef::name)
            .collect();
        assert_eq!(steps, vec!["normalize_text", "chunk_text", "dedup_chunks"]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn env_file_overrides_default_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[server]\nport = 9000\nhost = \"127.0.0.1\"\n[service.retrieval]\nmax_top_k = 10\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("test.toml"),
            "[server]\nport = 9100\n[service.ingestion]\npipeline = [\"chunk_text\", { name = \"dedup_chunks\" }]\n",
        )
        .unwrap();

        let cfg = load_config_from_dir(dir.path(), "test").unwrap();

        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.service.retrieval.max_top_k, 10);
        assert_eq!(cfg.service.ingestion.pipeline[1].name(), "dedup_chunks");
    }

    #[test]
    fn missing_directory_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from_dir(&dir.path().join("absent"), "production").unwrap();
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[server\nport = ").unwrap();

        let err = load_config_from_dir(dir.path(), "development").unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("default.toml"));
    }

    #[test]
    fn env_overrides_apply_and_reject_bad_values() {
        let vars = HashMap::from([
            ("DOCQA_SERVER__PORT".to_string(), "7070".to_string()),
            ("DOCQA_LOGGING__FORMAT".to_string(), "JSON".to_string()),
            ("DOCQA_SERVICE__ANSWER__PROVIDER".to_string(), "OpenAI".to_string()),
        ]);
        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides(|key| vars.get(key).cloned()).unwrap();
        assert_eq!(cfg.server.port, 7070);
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.service.answer.provider, "openai");

        let bad = HashMap::from([("DOCQA_SERVER__PORT".to_string(), "http".to_string())]);
        let err = cfg
            .apply_env_overrides(|key| bad.get(key).cloned())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { .. }));
    }

    #[test]
    fn validation_rejects_inconsistent_values() {
        let mut cfg = AppConfig::default();
        cfg.service.ingestion.chunk_overlap_words = cfg.service.ingestion.chunk_size_words;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.service.retrieval.default_top_k = 50;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.service.answer.provider = "magic".to_string();
        assert!(cfg.validate().is_err());
    }
}
