use std::sync::Arc;

use crate::records::RecordService;
use crate::tenancy::{
    CallerIdentity, NewTenant, Tenant, TenancyError, TenantDirectory, TenantSummary,
};

/// Tenant lookups and administration on top of the directory.
///
/// Summaries carry aggregate counts only; no tenant-owned record leaves this
/// service.
#[derive(Clone)]
pub struct TenantService {
    directory: Arc<dyn TenantDirectory>,
    records: RecordService,
}

impl TenantService {
    pub fn new(directory: Arc<dyn TenantDirectory>, records: RecordService) -> Self {
        Self { directory, records }
    }

    pub fn directory(&self) -> &Arc<dyn TenantDirectory> {
        &self.directory
    }

    /// Public lookup by slug, used by login pages before any session exists
    pub async fn lookup_summary(&self, slug: &str) -> Result<TenantSummary, TenancyError> {
        let tenant = self.directory.lookup_by_slug(slug.trim()).await?;
        self.summarize(tenant).await
    }

    pub async fn list_summaries(&self) -> Result<Vec<TenantSummary>, TenancyError> {
        let tenants = self.directory.list().await?;

        let mut summaries = Vec::with_capacity(tenants.len());
        for tenant in tenants {
            summaries.push(self.summarize(tenant).await?);
        }
        Ok(summaries)
    }

    /// Administrative creation; only admin roles may add tenants
    pub async fn create_tenant(
        &self,
        caller: &CallerIdentity,
        input: NewTenant,
    ) -> Result<Tenant, TenancyError> {
        if !caller.is_admin() {
            tracing::warn!(
                "Caller '{}' with role '{}' attempted to create tenant '{}'",
                caller.id,
                caller.role,
                input.slug
            );
            return Err(TenancyError::Forbidden(format!(
                "role '{}' may not create tenants",
                caller.role
            )));
        }

        let tenant = self.directory.create(input).await?;
        tracing::info!("Tenant '{}' created by '{}'", tenant.slug, caller.id);
        Ok(tenant)
    }

    async fn summarize(&self, tenant: Tenant) -> Result<TenantSummary, TenancyError> {
        let counts = self
            .records
            .counts_for_tenant(&tenant.id)
            .await
            .map_err(|e| TenancyError::Store(e.to_string()))?;
        Ok(TenantSummary::new(tenant, counts))
    }
}
