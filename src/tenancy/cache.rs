use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::config::TenancyConfig;

use super::directory::TenantDirectory;
use super::error::TenancyError;
use super::model::{NewTenant, Tenant, TenantId};

/// Read-through TTL cache in front of another directory.
///
/// Only hits are cached: a slug that is missing now may be created later.
/// Slugs never change in place, so TTL expiry is the only invalidation.
pub struct CachedTenantDirectory {
    inner: Arc<dyn TenantDirectory>,
    by_slug: Cache<String, Tenant>,
    by_id: Cache<TenantId, Tenant>,
}

impl CachedTenantDirectory {
    pub fn new(inner: Arc<dyn TenantDirectory>, ttl: Duration, capacity: u64) -> Self {
        let by_slug = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        let by_id = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self { inner, by_slug, by_id }
    }

    pub fn from_config(inner: Arc<dyn TenantDirectory>, config: &TenancyConfig) -> Self {
        Self::new(
            inner,
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_capacity,
        )
    }

    async fn remember(&self, tenant: &Tenant) {
        self.by_slug
            .insert(tenant.slug.as_str().to_string(), tenant.clone())
            .await;
        self.by_id.insert(tenant.id.clone(), tenant.clone()).await;
    }
}

#[async_trait]
impl TenantDirectory for CachedTenantDirectory {
    async fn lookup_by_slug(&self, slug: &str) -> Result<Tenant, TenancyError> {
        if let Some(tenant) = self.by_slug.get(slug).await {
            return Ok(tenant);
        }
        let tenant = self.inner.lookup_by_slug(slug).await?;
        self.remember(&tenant).await;
        Ok(tenant)
    }

    async fn lookup_by_id(&self, id: &TenantId) -> Result<Tenant, TenancyError> {
        if let Some(tenant) = self.by_id.get(id).await {
            return Ok(tenant);
        }
        let tenant = self.inner.lookup_by_id(id).await?;
        self.remember(&tenant).await;
        Ok(tenant)
    }

    async fn create(&self, input: NewTenant) -> Result<Tenant, TenancyError> {
        let tenant = self.inner.create(input).await?;
        self.remember(&tenant).await;
        Ok(tenant)
    }

    async fn list(&self) -> Result<Vec<Tenant>, TenancyError> {
        self.inner.list().await
    }
}
