use standoff::prelude::*;
use standoff::{load_session_config, DEFAULT_ADDR};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), StandoffError> {
    init_tracing();

    let addr = std::env::var("STANDOFF_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string());

    let session_config = match std::env::var("STANDOFF_CONFIG") {
        Ok(path) => load_session_config(&path).await?,
        Err(_) => SessionConfig::default(),
    };

    let server = StandoffServer::builder()
        .bind(&addr)
        .session_config(session_config)
        .build()
        .await?;
    match server.local_addr() {
        Ok(local) => tracing::info!(addr = %local, "listening"),
        Err(e) => tracing::warn!(error = %e, "local address unavailable"),
    }

    server.run().await
}
