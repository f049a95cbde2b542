pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod test_utils;

use application::{
    bootstrap::bootstrap_admins,
    services::{AccessControlError, AccessControlService},
    unit_groups::UnitGroupService,
};
use infrastructure::{
    Database, InMemoryKeyValueStore, JsonFileKeyValueStore, KeyValueStore, PostgresKeyValueStore,
    StoreError,
};
use interface::AppState;
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

const DEFAULT_DATABASE_PATH: &str = "database.json";

/// Where the key-value collections are kept.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Memory,
    File(PathBuf),
    Postgres(String),
}

/// Application configuration with all environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub admins: Vec<String>,
    pub store_backend: StoreBackend,
}

impl AppConfig {
    /// Creates a new AppConfig from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Creates an AppConfig from any variable source (useful for testing)
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let admins = var("ADMINS")
            .ok_or_else(|| ConfigError::MissingRequired("ADMINS".to_string()))
            .map(|raw| parse_admins(&raw))?;

        let backend = var("STORE_BACKEND").unwrap_or_else(|| "file".to_string());
        let store_backend = match backend.trim().to_ascii_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "file" => StoreBackend::File(PathBuf::from(
                var("DATABASE").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            )),
            "postgres" => StoreBackend::Postgres(
                var("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingRequired("DATABASE_URL".to_string()))?,
            ),
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unknown STORE_BACKEND '{other}'"
                )));
            }
        };

        Ok(AppConfig {
            admins,
            store_backend,
        })
    }

    /// Creates an AppConfig with custom values (useful for testing)
    pub fn new(admins: Vec<String>, store_backend: StoreBackend) -> Self {
        Self {
            admins,
            store_backend,
        }
    }
}

fn parse_admins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|admin| admin.trim().trim_start_matches('@'))
        .filter(|admin| !admin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingRequired(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Opens the key-value store selected by the configuration.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>, AppError> {
    let store: Arc<dyn KeyValueStore> = match &config.store_backend {
        StoreBackend::Memory => Arc::new(InMemoryKeyValueStore::new()),
        StoreBackend::File(path) => Arc::new(JsonFileKeyValueStore::open(path).await?),
        StoreBackend::Postgres(url) => {
            let pool = PgPool::connect(url).await?;
            let store = PostgresKeyValueStore::new(pool);
            store.ensure_schema().await?;
            Arc::new(store)
        }
    };
    Ok(store)
}

// ============================================================================
// APPLICATION BUILDER
// ============================================================================

/// Builder for creating application state with better testability
#[derive(Default)]
pub struct AppStateBuilder {
    store: Option<Arc<dyn KeyValueStore>>,
    config: Option<AppConfig>,
}

impl AppStateBuilder {
    /// Creates a new AppStateBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backing store
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the configuration
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Initializes the database, wires the services, and bootstraps the
    /// configured administrators.
    pub async fn build(self) -> Result<Arc<AppState>, AppError> {
        let store = self.store.ok_or(AppError::MissingStore)?;

        let database = Arc::new(Database::new(store));
        database.initialize().await?;

        let access_control = Arc::new(AccessControlService::new(database.clone()));
        let unit_groups = Arc::new(UnitGroupService::new(
            database.clone(),
            access_control.clone(),
        ));

        if let Some(config) = &self.config {
            bootstrap_admins(&access_control, &config.admins).await?;
        }

        info!("application state ready");
        Ok(Arc::new(AppState {
            database,
            access_control,
            unit_groups,
        }))
    }
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing key-value store")]
    MissingStore,
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Initialization error: {0}")]
    Initialization(#[from] AccessControlError),
}
