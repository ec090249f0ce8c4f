use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::error::TenancyError;
use super::model::{NewTenant, Tenant, TenantId};

/// Read (and administrative create) access to the tenant collection.
///
/// Absence is a normal outcome: lookups return [`TenancyError::NotFound`]
/// rather than an internal error.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn lookup_by_slug(&self, slug: &str) -> Result<Tenant, TenancyError>;

    async fn lookup_by_id(&self, id: &TenantId) -> Result<Tenant, TenancyError>;

    /// Fails with [`TenancyError::SlugConflict`] when the slug is taken; never
    /// creates a second tenant with the same slug.
    async fn create(&self, input: NewTenant) -> Result<Tenant, TenancyError>;

    async fn list(&self) -> Result<Vec<Tenant>, TenancyError>;
}

/// Process-local directory used for development and tests
#[derive(Default)]
pub struct MemoryTenantDirectory {
    by_slug: RwLock<HashMap<String, Tenant>>,
}

impl MemoryTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a directory with pre-built tenants (fixed ids are kept as-is)
    pub fn with_tenants(tenants: impl IntoIterator<Item = Tenant>) -> Self {
        let by_slug = tenants
            .into_iter()
            .map(|t| (t.slug.as_str().to_string(), t))
            .collect();
        Self {
            by_slug: RwLock::new(by_slug),
        }
    }
}

#[async_trait]
impl TenantDirectory for MemoryTenantDirectory {
    async fn lookup_by_slug(&self, slug: &str) -> Result<Tenant, TenancyError> {
        self.by_slug
            .read()
            .await
            .get(slug)
            .cloned()
            .ok_or_else(|| TenancyError::NotFound(slug.to_string()))
    }

    async fn lookup_by_id(&self, id: &TenantId) -> Result<Tenant, TenancyError> {
        self.by_slug
            .read()
            .await
            .values()
            .find(|t| &t.id == id)
            .cloned()
            .ok_or_else(|| TenancyError::NotFound(id.to_string()))
    }

    async fn create(&self, input: NewTenant) -> Result<Tenant, TenancyError> {
        let slug = input.validate()?;

        // Check and insert under one write lock so concurrent creates cannot both win
        let mut by_slug = self.by_slug.write().await;
        if by_slug.contains_key(slug.as_str()) {
            return Err(TenancyError::SlugConflict(slug.to_string()));
        }

        let now = Utc::now();
        let tenant = Tenant {
            id: TenantId::generate(),
            name: input.name.trim().to_string(),
            slug,
            logo: input.logo,
            created_at: now,
            updated_at: now,
        };
        by_slug.insert(tenant.slug.as_str().to_string(), tenant.clone());

        tracing::info!("Created tenant '{}' ({})", tenant.slug, tenant.id);
        Ok(tenant)
    }

    async fn list(&self) -> Result<Vec<Tenant>, TenancyError> {
        let mut tenants: Vec<Tenant> = self.by_slug.read().await.values().cloned().collect();
        tenants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tenants)
    }
}
