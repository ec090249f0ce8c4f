use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::directory::TenantDirectory;
use super::error::TenancyError;
use super::model::{Tenant, TenantId, TenantSlug};

/// Authenticated caller, as produced by the session layer.
///
/// The claimed tenant is fixed when the session token is issued and is never
/// taken from request parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub id: String,
    pub claimed_tenant_id: Option<TenantId>,
    pub role: String,
}

impl CallerIdentity {
    pub fn is_admin(&self) -> bool {
        matches!(self.role.as_str(), "admin" | "superadmin")
    }
}

/// Mandatory predicate for every record operation.
///
/// Only [`ScopingGuard::authorize_tenant_scope`] can build one; there is no
/// constructor reachable from request input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantFilter {
    tenant_id: TenantId,
}

impl TenantFilter {
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// True when `candidate` names the same tenant this filter is bound to
    pub fn admits(&self, candidate: &str) -> bool {
        self.tenant_id.as_str() == candidate
    }
}

#[derive(Clone)]
pub struct ScopingGuard {
    directory: Arc<dyn TenantDirectory>,
    allow_bootstrap_fallback: bool,
}

impl ScopingGuard {
    pub fn new(directory: Arc<dyn TenantDirectory>, allow_bootstrap_fallback: bool) -> Self {
        Self {
            directory,
            allow_bootstrap_fallback,
        }
    }

    /// Decide which tenant an operation is scoped to.
    ///
    /// The caller's claimed tenant always wins. The explicit request tenant is
    /// consulted only when the caller carries no claim at all (bootstrap
    /// sessions issued before tenant claims existed). The host slug never
    /// influences the decision.
    pub async fn authorize_tenant_scope(
        &self,
        resolved_slug: Option<&TenantSlug>,
        caller: Option<&CallerIdentity>,
        explicit_tenant_id: Option<&str>,
    ) -> Result<(TenantFilter, Tenant), TenancyError> {
        let caller = caller.ok_or(TenancyError::Unauthenticated)?;

        let effective = match &caller.claimed_tenant_id {
            Some(claimed) => claimed.clone(),
            None => {
                let explicit = explicit_tenant_id
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        TenancyError::UnknownTenant(format!("caller '{}' has no tenant", caller.id))
                    })?;

                if !self.allow_bootstrap_fallback {
                    tracing::warn!(
                        "Rejected request-supplied tenant '{}' for caller '{}' without a tenant claim",
                        explicit,
                        caller.id
                    );
                    return Err(TenancyError::UnknownTenant(format!(
                        "caller '{}' has no tenant",
                        caller.id
                    )));
                }

                tracing::warn!(
                    "Caller '{}' has no tenant claim; using request-supplied tenant '{}' (bootstrap fallback)",
                    caller.id,
                    explicit
                );
                TenantId::new(explicit)
            }
        };

        let tenant = match self.directory.lookup_by_id(&effective).await {
            Ok(tenant) => tenant,
            Err(TenancyError::NotFound(_)) => {
                tracing::warn!("Caller '{}' scoped to unknown tenant '{}'", caller.id, effective);
                return Err(TenancyError::UnknownTenant(effective.to_string()));
            }
            Err(other) => return Err(other),
        };

        if let Some(slug) = resolved_slug {
            if slug != &tenant.slug {
                tracing::debug!(
                    "Host addresses tenant '{}' but caller '{}' is scoped to '{}'",
                    slug,
                    caller.id,
                    tenant.slug
                );
            }
        }

        let filter = TenantFilter {
            tenant_id: tenant.id.clone(),
        };
        Ok((filter, tenant))
    }
}

/// Test-only access to filters for store-level unit tests.
#[cfg(test)]
pub(crate) fn filter_for_tests(tenant_id: &str) -> TenantFilter {
    TenantFilter {
        tenant_id: TenantId::new(tenant_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenancy::directory::MemoryTenantDirectory;
    use chrono::Utc;

    fn tenant(id: &str, slug: &str) -> Tenant {
        Tenant {
            id: TenantId::new(id),
            name: slug.to_string(),
            slug: TenantSlug::parse(slug).unwrap(),
            logo: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn guard(allow_fallback: bool) -> ScopingGuard {
        let directory = MemoryTenantDirectory::with_tenants([
            tenant("t-alnoor", "alnoor"),
            tenant("t-madinah", "madinah"),
        ]);
        ScopingGuard::new(Arc::new(directory), allow_fallback)
    }

    fn caller(claimed: Option<&str>) -> CallerIdentity {
        CallerIdentity {
            id: "u1".to_string(),
            claimed_tenant_id: claimed.map(TenantId::new),
            role: "teacher".to_string(),
        }
    }

    #[tokio::test]
    async fn missing_caller_is_unauthenticated() {
        let slug = TenantSlug::parse("alnoor").unwrap();
        for resolved in [None, Some(&slug)] {
            let result = guard(true).authorize_tenant_scope(resolved, None, Some("t-alnoor")).await;
            assert!(matches!(result, Err(TenancyError::Unauthenticated)));
        }
    }

    #[tokio::test]
    async fn claimed_tenant_wins_over_host_slug() {
        let host = TenantSlug::parse("madinah").unwrap();
        let (filter, tenant) = guard(true)
            .authorize_tenant_scope(Some(&host), Some(&caller(Some("t-alnoor"))), None)
            .await
            .unwrap();

        assert_eq!(filter.tenant_id().as_str(), "t-alnoor");
        assert_eq!(tenant.slug.as_str(), "alnoor");
    }

    #[tokio::test]
    async fn claimed_tenant_wins_over_explicit_request_tenant() {
        let (filter, _) = guard(true)
            .authorize_tenant_scope(None, Some(&caller(Some("t-alnoor"))), Some("t-madinah"))
            .await
            .unwrap();
        assert!(filter.admits("t-alnoor"));
        assert!(!filter.admits("t-madinah"));
    }

    #[tokio::test]
    async fn explicit_tenant_is_used_only_without_a_claim() {
        let (filter, _) = guard(true)
            .authorize_tenant_scope(None, Some(&caller(None)), Some("t-madinah"))
            .await
            .unwrap();
        assert_eq!(filter.tenant_id().as_str(), "t-madinah");
    }

    #[tokio::test]
    async fn fallback_can_be_disabled() {
        let result = guard(false)
            .authorize_tenant_scope(None, Some(&caller(None)), Some("t-madinah"))
            .await;
        assert!(matches!(result, Err(TenancyError::UnknownTenant(_))));
    }

    #[tokio::test]
    async fn no_claim_and_no_explicit_tenant_is_unknown() {
        let result = guard(true).authorize_tenant_scope(None, Some(&caller(None)), Some("  ")).await;
        assert!(matches!(result, Err(TenancyError::UnknownTenant(_))));
    }

    #[tokio::test]
    async fn unresolvable_claim_is_unknown_tenant() {
        let result = guard(true)
            .authorize_tenant_scope(None, Some(&caller(Some("t-gone"))), Some("t-alnoor"))
            .await;
        assert!(matches!(result, Err(TenancyError::UnknownTenant(id)) if id == "t-gone"));
    }
}
