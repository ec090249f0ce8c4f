// Protected handlers: every handler takes a `TenantScope`, so none runs
// without an authorized tenant filter.
pub mod records;
pub mod whoami;
