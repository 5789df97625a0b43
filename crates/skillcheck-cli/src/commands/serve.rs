//! The `skillcheck serve` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use skillcheck_providers::load_config_from;
use skillcheck_server::AppState;

pub async fn execute(config_path: Option<PathBuf>, bind: Option<String>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let state = Arc::new(AppState::from_config(&config)?);
    let addr = bind.unwrap_or_else(|| config.server.bind.clone());
    tracing::info!(%addr, context = ?config.context_strategy, "serve command");
    skillcheck_server::serve(state, &addr).await
}
