mod app;
mod auth;
mod config;
mod db;
mod error;
mod memory;
mod projects;
mod state;
mod validation;


use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "projectdesk=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let addr = config.bind_addr();
    let (app_state, pool) = AppState::init(&config).await?;

    if let Some(db) = &pool {
        db::migrate(db).await?;
    }

    app::serve(app::build_app(app_state), &addr).await?;

    if let Some(db) = pool {
        db.close().await;
    }
    tracing::info!("server stopped");
    Ok(())
}
