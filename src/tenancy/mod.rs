//! Tenant resolution and scoping.
//!
//! Host → [`TenantResolver`] (informational slug) → [`ScopingGuard`]
//! (claimed tenant checked against the [`TenantDirectory`]) → [`TenantFilter`]
//! handed to every record operation.

pub mod cache;
pub mod directory;
pub mod error;
pub mod guard;
pub mod model;
pub mod resolver;

pub use cache::CachedTenantDirectory;
pub use directory::{MemoryTenantDirectory, TenantDirectory};
pub use error::TenancyError;
pub use guard::{CallerIdentity, ScopingGuard, TenantFilter};
pub use model::{NewTenant, Tenant, TenantCounts, TenantId, TenantSlug, TenantSummary};
pub use resolver::TenantResolver;
