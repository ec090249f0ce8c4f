use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::TenancyError;

/// Opaque, stable tenant identifier (the foreign key carried by every record)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase, subdomain-safe tenant slug.
///
/// Construction through [`TenantSlug::parse`] enforces the DNS label rules:
/// 2..=63 characters of `[a-z0-9-]`, no leading or trailing hyphen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantSlug(String);

impl TenantSlug {
    pub const MIN_LEN: usize = 2;
    pub const MAX_LEN: usize = 63;

    pub fn parse(raw: &str) -> Result<Self, TenancyError> {
        let slug = raw.trim();

        if slug.len() < Self::MIN_LEN || slug.len() > Self::MAX_LEN {
            return Err(TenancyError::InvalidSlug(format!(
                "slug must be between {} and {} characters",
                Self::MIN_LEN,
                Self::MAX_LEN
            )));
        }

        if !slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(TenancyError::InvalidSlug(
                "slug can only contain lowercase letters, digits and hyphens".to_string(),
            ));
        }

        if slug.starts_with('-') || slug.ends_with('-') {
            return Err(TenancyError::InvalidSlug(
                "slug cannot start or end with a hyphen".to_string(),
            ));
        }

        Ok(Self(slug.to_string()))
    }

    /// Wraps a host label without validation; lookups treat it as a plain key.
    pub(crate) fn from_label(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub slug: TenantSlug,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Administrative tenant creation input
#[derive(Debug, Clone, Deserialize)]
pub struct NewTenant {
    pub name: String,
    pub slug: String,
    pub logo: Option<String>,
}

impl NewTenant {
    pub(crate) fn validate(&self) -> Result<TenantSlug, TenancyError> {
        if self.name.trim().is_empty() {
            return Err(TenancyError::InvalidName("tenant name is required".to_string()));
        }
        TenantSlug::parse(&self.slug)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantCounts {
    pub users: i64,
    pub students: i64,
}

/// Tenant as surfaced by the lookup entry point
#[derive(Debug, Clone, Serialize)]
pub struct TenantSummary {
    pub id: TenantId,
    pub name: String,
    pub slug: TenantSlug,
    pub logo: Option<String>,
    pub counts: TenantCounts,
}

impl TenantSummary {
    pub fn new(tenant: Tenant, counts: TenantCounts) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name,
            slug: tenant.slug,
            logo: tenant.logo,
            counts,
        }
    }
}
