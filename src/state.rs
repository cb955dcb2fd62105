use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::{
    auth::{jwt::JwtKeys, repo::PgUserRepo, repo::UserRepo},
    config::{AppConfig, JwtConfig},
    memory::MemoryStore,
    projects::repo::{PgProjectRepo, ProjectRepo},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub projects: Arc<dyn ProjectRepo>,
    pub jwt: JwtKeys,
}

impl AppState {
    /// Builds the state once per process. Returns the pool too so the caller
    /// can run migrations and close it on shutdown.
    pub async fn init(config: &AppConfig) -> anyhow::Result<(Self, Option<PgPool>)> {
        let Some(url) = config.database_url.as_deref() else {
            warn!("DATABASE_URL not set; using in-memory store, data will not survive restart");
            return Ok((Self::in_memory(&config.jwt), None));
        };

        let db = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(url)
            .await
            .context("connect to database")?;
        info!(max_connections = config.db_max_connections, "connected to postgres");
        Ok((Self::postgres(db.clone(), &config.jwt), Some(db)))
    }

    pub fn postgres(db: PgPool, jwt: &JwtConfig) -> Self {
        Self::from_parts(
            Arc::new(PgUserRepo::new(db.clone())),
            Arc::new(PgProjectRepo::new(db)),
            jwt,
        )
    }

    pub fn in_memory(jwt: &JwtConfig) -> Self {
        let store = MemoryStore::new();
        Self::from_parts(Arc::new(store.clone()), Arc::new(store), jwt)
    }

    pub fn from_parts(
        users: Arc<dyn UserRepo>,
        projects: Arc<dyn ProjectRepo>,
        jwt: &JwtConfig,
    ) -> Self {
        Self {
            users,
            projects,
            jwt: JwtKeys::new(jwt),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::in_memory(&JwtConfig {
            secret: "test".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
        })
    }
}
