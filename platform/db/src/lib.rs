//! Persistence layer: connection wiring, actor loading and the query scoping
//! adapter that turns access predicates into SQL filters.

use std::time::Duration;

use platform_authz::{AuthzError, ResourceKind};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

pub mod actor;
pub mod dashboard;
pub mod reports;
pub mod scope;

pub use actor::{authz_role, entity_role, load_actor};
pub use dashboard::{DashboardCounts, dashboard};
pub use scope::{ScopedEntity, Traversal, authorize_or_deny, find_scoped, scoped_collection};

/// Shared connection pool.
pub type DbPool = DatabaseConnection;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("database url missing")]
    MissingUrl,
    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: Uuid },
    #[error(transparent)]
    Denied(#[from] AuthzError),
    #[error("cannot move report from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl DbError {
    pub fn not_found(kind: ResourceKind, id: Uuid) -> Self {
        DbError::NotFound { kind, id }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Environment-driven connection settings.
#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_url_key")]
    env_key: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            env_key: default_url_key(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_url_key() -> String {
    "DATABASE_URL".to_string()
}

fn default_max_connections() -> u32 {
    10
}

impl DatabaseSettings {
    pub fn new(env_key: impl Into<String>) -> Self {
        Self {
            env_key: env_key.into(),
            ..Self::default()
        }
    }

    /// Reads `DB_MAX_CONNECTIONS` on top of the defaults.
    pub fn from_env() -> Self {
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(default_max_connections);
        Self {
            max_connections,
            ..Self::default()
        }
    }

    pub fn database_url(&self) -> Result<String, DbError> {
        std::env::var(&self.env_key).map_err(|_| DbError::MissingUrl)
    }
}

/// Open a pool against the configured database.
pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    let url = settings.database_url()?;
    connect_url(&url, settings.max_connections).await
}

pub async fn connect_url(url: &str, max_connections: u32) -> DbResult<DbPool> {
    let mut options = ConnectOptions::new(url.to_owned());
    options
        .max_connections(max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let pool = Database::connect(options).await?;
    info!(max_connections, "database pool ready");
    Ok(pool)
}
