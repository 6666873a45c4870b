use anyhow::{Context, Result};
use axum::Router;
use tracing::info;

use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::tokens::TokenState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub tokens: TokenState,
}

impl AppState {
    pub fn new(metrics: &Metrics, tokens: TokenState) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            tokens,
        }
    }
}

pub async fn router(settings_config: &SettingsConfig, tokens: TokenState) -> Router {
    let metrics = get_metrics().await;
    let state = AppState::new(metrics, tokens);

    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(state.tokens.router())
        .with_state(state)
}

/// Start one Axum server serving target tokens and metrics.
pub async fn start(settings_config: &SettingsConfig, tokens: TokenState) -> Result<()> {
    let app = router(settings_config, tokens).await;

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("listening on {}", bind_addr);
    get_metrics().await.up.set(1);
    axum::serve(listener, app).await?;

    Ok(())
}
