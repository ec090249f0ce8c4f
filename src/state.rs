use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgRecordStore, PgTenantDirectory};
use crate::records::{MemoryRecordStore, RecordService, RecordStore};
use crate::services::TenantService;
use crate::tenancy::{
    CachedTenantDirectory, MemoryTenantDirectory, ScopingGuard, TenantDirectory, TenantResolver,
};

/// Shared, immutable application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub resolver: TenantResolver,
    pub guard: ScopingGuard,
    pub tenants: TenantService,
    pub records: RecordService,
    pub database: Option<DatabaseManager>,
}

impl AppState {
    /// Wire the collaborators around an existing directory and record store
    pub fn new(
        config: AppConfig,
        directory: Arc<dyn TenantDirectory>,
        store: Arc<dyn RecordStore>,
        database: Option<DatabaseManager>,
    ) -> Self {
        let directory: Arc<dyn TenantDirectory> =
            Arc::new(CachedTenantDirectory::from_config(directory, &config.tenancy));
        let records = RecordService::new(store, config.security.bcrypt_cost);

        Self {
            resolver: TenantResolver::from_config(&config.tenancy),
            guard: ScopingGuard::new(directory.clone(), config.tenancy.allow_bootstrap_fallback),
            tenants: TenantService::new(directory, records.clone()),
            records,
            database,
            config: Arc::new(config),
        }
    }

    /// PostgreSQL-backed state, running migrations when configured
    pub async fn connect(config: AppConfig) -> anyhow::Result<Self> {
        let database = DatabaseManager::connect(&config.database).await?;
        if config.database.run_migrations {
            database.migrate().await?;
        }

        let pool = database.pool().clone();
        let directory = Arc::new(PgTenantDirectory::new(pool.clone()));
        let store = Arc::new(PgRecordStore::new(pool, config.api.max_list_limit));

        Ok(Self::new(config, directory, store, Some(database)))
    }

    /// State over the in-memory stores, used for local runs without a database
    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(MemoryRecordStore::new(config.api.max_list_limit));
        Self::new(config, Arc::new(MemoryTenantDirectory::new()), store, None)
    }
}
