//! Tenant-owned records.
//!
//! Every [`RecordStore`] operation takes a [`TenantFilter`] and applies it as
//! an equality predicate on `tenant_id`. Stores reject payloads or list
//! filters that name any other tenant instead of silently ignoring them.

pub mod entity;
pub mod memory;
pub mod service;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::tenancy::{TenantCounts, TenantFilter, TenantId};

pub use entity::{EntityKind, SortDirection, SYSTEM_FIELDS};
pub use memory::MemoryRecordStore;
pub use service::RecordService;

/// A record as a flat JSON object keyed by column name
pub type Record = Map<String, Value>;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Unknown column '{column}' for {entity}")]
    UnknownColumn { entity: &'static str, column: String },

    #[error("System field '{0}' cannot be set via API")]
    SystemFieldNotAllowed(String),

    #[error("Missing required field '{0}'")]
    MissingRequiredField(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Request names tenant '{requested}' outside the authorized scope")]
    TenantBypass { requested: String },

    #[error("Referenced {entity} '{id}' does not exist in this tenant")]
    CrossTenantReference { entity: &'static str, id: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Record store error: {0}")]
    Store(String),
}

impl From<crate::database::DatabaseError> for RecordError {
    fn from(err: crate::database::DatabaseError) -> Self {
        RecordError::Store(err.to_string())
    }
}

/// Equality filters and paging for list operations
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filters: Vec<(String, String)>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    /// Checks filter columns against the entity and the tenant scope
    pub fn validate(&self, filter: &TenantFilter, kind: EntityKind) -> Result<(), RecordError> {
        for (column, value) in &self.filters {
            if column == "tenant_id" {
                if filter.admits(value) {
                    continue;
                }
                return Err(RecordError::TenantBypass {
                    requested: value.clone(),
                });
            }
            if !kind.filterable().contains(&column.as_str()) {
                return Err(RecordError::UnknownColumn {
                    entity: kind.path(),
                    column: column.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Credential material needed to authenticate a user, read before any
/// session exists
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user_id: String,
    pub tenant_id: TenantId,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub password_hash: String,
    pub is_active: bool,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(
        &self,
        filter: &TenantFilter,
        kind: EntityKind,
        query: &ListQuery,
    ) -> Result<Vec<Record>, RecordError>;

    async fn get(&self, filter: &TenantFilter, kind: EntityKind, id: &str) -> Result<Record, RecordError>;

    /// Inserts a fully prepared record; its `tenant_id` must match the filter
    async fn insert(&self, filter: &TenantFilter, kind: EntityKind, record: Record) -> Result<Record, RecordError>;

    /// Applies a prepared patch to a record owned by the filter's tenant
    async fn update(
        &self,
        filter: &TenantFilter,
        kind: EntityKind,
        id: &str,
        patch: Record,
    ) -> Result<Record, RecordError>;

    async fn delete(&self, filter: &TenantFilter, kind: EntityKind, id: &str) -> Result<(), RecordError>;

    /// Aggregate user/student counts; returns no record data
    async fn counts_for_tenant(&self, tenant_id: &TenantId) -> Result<TenantCounts, RecordError>;

    /// Looks up login credentials for an email within one tenant
    async fn find_credentials(
        &self,
        tenant_id: &TenantId,
        email: &str,
    ) -> Result<Option<StoredCredentials>, RecordError>;
}

/// Rejects a record whose `tenant_id` differs from the filter.
///
/// Shared by store implementations so the check happens at the store boundary
/// whatever the caller did beforehand.
pub(crate) fn ensure_in_scope(filter: &TenantFilter, record: &Record) -> Result<(), RecordError> {
    match record.get("tenant_id") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(id)) if filter.admits(id) => Ok(()),
        Some(other) => Err(RecordError::TenantBypass {
            requested: match other {
                Value::String(s) => s.clone(),
                v => v.to_string(),
            },
        }),
    }
}
