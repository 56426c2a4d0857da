use std::env;

use anyhow::{Context, Result};
use smarttrip_api::build_app;
use smarttrip_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("smarttrip_api");

    let bind = env::var("SMARTTRIP_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = build_app()?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(bind = %bind, "smarttrip api started");

    axum::serve(listener, app).await?;
    Ok(())
}
