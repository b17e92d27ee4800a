use anyhow::Context;
use paper_analysis_service::{AppConfig, create_app, telemetry::init_tracing};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;
    info!(
        model = %config.llm_model,
        web_search = config.tavily_api_key.is_some(),
        ai_detection = config.winston_api_key.is_some(),
        concurrency = config.citation_concurrency,
        "Configuration loaded"
    );

    let app = create_app(&config)?;
    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    let addr = listener.local_addr()?;

    info!("Paper Analysis Service listening on {}", addr);
    info!("Analysis endpoint: POST http://{}/papers/analyze", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
