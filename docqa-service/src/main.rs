use anyhow::Result;
use docqa_configuration::{load_config, setup_logging};
use docqa_setup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    setup_logging(&config);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        answer_provider = %config.service.answer.provider,
        "starting docqa service"
    );
    let server_config = config.server.clone();
    let app = Application::new(config).await?;
    app.run(server_config).await?;
    tracing::info!("docqa service stopped");
    Ok(())
}
