use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors raised by the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Unique constraint '{constraint}' violated")]
    UniqueViolation { constraint: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DatabaseError {
    /// Postgres SQLSTATE for `unique_violation`
    pub const UNIQUE_VIOLATION: &'static str = "23505";

    /// Lift a unique violation out of a driver error so callers can match on it
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some(Self::UNIQUE_VIOLATION) {
                let constraint = db.constraint().unwrap_or_default().to_string();
                return DatabaseError::UniqueViolation { constraint };
            }
        }
        DatabaseError::Sqlx(err)
    }

    pub fn is_unique_violation(&self, constraint: &str) -> bool {
        matches!(self, DatabaseError::UniqueViolation { constraint: c } if c == constraint)
    }
}

/// Owns the Postgres connection pool for the component store
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Open a pool using the configured limits. Every pooled connection gets the
    /// configured statement timeout.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config
            .url
            .clone()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let redacted = Self::redacted_url(&url)?;

        let statement_timeout = config.statement_timeout_ms;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    if statement_timeout > 0 {
                        conn.execute(format!("SET statement_timeout = {}", statement_timeout).as_str())
                            .await?;
                    }
                    Ok(())
                })
            })
            .connect(&url)
            .await?;

        info!(database = %redacted, max_connections = config.max_connections, "Connected database pool");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    /// Connection string with the password masked, for log output
    fn redacted_url(raw: &str) -> Result<String, DatabaseError> {
        let mut url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if url.password().is_some() {
            url.set_password(Some("****"))
                .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        Ok(url.into())
    }
}
