// Public handlers: no session required. Tenant lookups here return branding
// and aggregate counts only, never tenant-owned records.
pub mod login;
pub mod system;
pub mod tenants;
