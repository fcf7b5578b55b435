//! Factory for creating database clients

use crate::client::DbClient;
use crate::error::DbError;
use bodywork_config::AppConfig;
use tracing::debug;

/// Factory for creating database clients
#[derive(Debug, Clone, Default)]
pub struct DbClientFactory;

impl DbClientFactory {
    pub fn new() -> Self {
        Self
    }

    /// Create a database client from the `[database]` section of the application configuration
    pub async fn from_app_config(&self, config: &AppConfig) -> Result<DbClient, DbError> {
        debug!("Creating database client from application configuration");
        DbClient::from_config(&config.database).await
    }
}
