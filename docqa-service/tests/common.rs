use reqwest::Client;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use docqa_configuration::AppConfig;
use docqa_setup::Application;

pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.service.ingestion.chunk_size_words = 40;
    config.service.ingestion.chunk_overlap_words = 8;
    config.service.ingestion.max_documents_per_request = 4;
    config
}

pub async fn setup_test_server() -> Result<TestServer, Box<dyn std::error::Error>> {
    setup_test_server_with(test_config()).await
}

pub async fn setup_test_server_with(
    config: AppConfig,
) -> Result<TestServer, Box<dyn std::error::Error>> {
    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    let app = Application::new(config).await?;
    let handle = tokio::spawn(async move {
        if let Err(err) = app.serve(listener).await {
            eprintln!("test server stopped: {err}");
        }
    });

    Ok(TestServer {
        base_url,
        client: Client::new(),
        handle,
    })
}
