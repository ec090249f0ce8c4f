// Elevated handlers: authenticated callers with an admin role.
pub mod tenants;
