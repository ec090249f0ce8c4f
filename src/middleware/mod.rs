pub mod auth;
pub mod host;
pub mod response;
pub mod scope;

pub use auth::identify_caller_middleware;
pub use host::{resolve_host_middleware, HostTenant};
pub use response::{ApiResponse, ApiResult};
pub use scope::{Caller, TenantScope, EXPLICIT_TENANT_KEYS};
