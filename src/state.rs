use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    config::AppConfig,
    mail::SmtpMailer,
    users::{jwt::JwtKeys, password::Argon2Hasher, repo::PgUserStore, service::UserService},
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<UserService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let mailer = Arc::new(SmtpMailer::new(&config.mail)?);
        let service = Arc::new(UserService::new(
            Arc::new(PgUserStore::new(db)),
            Arc::new(Argon2Hasher),
            mailer,
            JwtKeys::from(&config.jwt),
            config.frontend_url.clone(),
        ));

        Ok(Self { service, config })
    }
}
