use std::sync::Arc;

use cat_advisor::api::{router, AppState};
use cat_advisor::config::{GeminiConfig, ServerConfig};
use cat_advisor::observability::LoggingConfig;
use cat_advisor::prompts::PromptStore;
use cat_advisor::services::GeminiContentService;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let server_config = ServerConfig::from_env()?;

    LoggingConfig::new()
        .with_level(server_config.log_level)
        .with_format(server_config.log_format)
        .init()?;

    let gemini_config = GeminiConfig::from_env()?;
    tracing::info!(
        model = %gemini_config.model,
        attempt_timeout_ms = gemini_config.attempt_timeout_ms,
        max_attempts = gemini_config.retry_config.max_attempts,
        "Gemini configuration loaded"
    );

    let service = GeminiContentService::from_config(&gemini_config)?;
    let prompt_data = PromptStore::new(server_config.prompt_data_path.clone()).load().await;

    let state = AppState::new(Arc::new(service), prompt_data)
        .with_max_body_bytes(server_config.max_body_bytes);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(server_config.bind_addr).await?;
    tracing::info!(addr = %server_config.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
