use crate::config::AppConfig;
use crate::mailer::{LogMailer, Mailer};
use crate::session::SessionHub;
use crate::store::{DocumentStore, MemoryStore, PgDocumentStore};
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<AppConfig>,
    pub sessions: SessionHub,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.database_url {
            Some(url) => {
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(PgDocumentStore::new(db)) as Arc<dyn DocumentStore>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store");
                Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>
            }
        };

        Ok(Self::from_parts(store, config, Arc::new(LogMailer)))
    }

    pub fn from_parts(store: Arc<dyn DocumentStore>, config: Arc<AppConfig>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            config,
            sessions: SessionHub::new(),
            mailer,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(Arc::new(MemoryStore::new()))
    }

    #[cfg(test)]
    pub fn fake_with(store: Arc<dyn DocumentStore>) -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            google: None,
            public_base_url: "http://localhost:3000".into(),
            login_path: "/login".into(),
        });
        Self::from_parts(store, config, Arc::new(LogMailer))
    }
}
