use std::sync::Arc;

use anyhow::Result;
use hellobot_core::SlackSender;
use hellobot_ingress_slack::{AppState, Config, router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let http = reqwest::Client::builder()
        .timeout(config.send_timeout)
        .build()?;
    let sender = Arc::new(SlackSender::new(
        http,
        &config.bot_token,
        config.api_base.clone(),
    ));
    let state = AppState::new(&config.signing_secret, sender);
    let app = router(state);

    tracing::info!("ingress-slack listening on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
