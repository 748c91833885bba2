use mnistfeed::{config, server};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Init logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mnistfeed=info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // 2. Load Config
    let config_path =
        std::env::var("MNISTFEED_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let config = config::AppConfig::from_file(&config_path)?;
    info!(
        model = %config.model.name,
        inputs = ?config.model.input_names,
        outputs = ?config.model.output_names,
        "loaded {config_path}"
    );

    // 3. Create Router
    let app = server::routes::create_router(config.model);

    // 4. Bind & Serve
    let listener =
        TcpListener::bind(format!("{}:{}", config.server.host, config.server.port)).await?;
    info!(
        "Server listening on http://{}:{}",
        config.server.host, config.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
