use thiserror::Error;

/// Failures of tenant resolution and scoping.
///
/// All variants are deterministic functions of the input; none are retried.
#[derive(Debug, Error)]
pub enum TenancyError {
    #[error("Tenant not found: {0}")]
    NotFound(String),

    #[error("Malformed host: {0}")]
    MalformedHost(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Unknown tenant: {0}")]
    UnknownTenant(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Slug already taken: {0}")]
    SlugConflict(String),

    #[error("Invalid slug: {0}")]
    InvalidSlug(String),

    #[error("Invalid tenant name: {0}")]
    InvalidName(String),

    #[error("Tenant store error: {0}")]
    Store(String),
}

impl From<crate::database::DatabaseError> for TenancyError {
    fn from(err: crate::database::DatabaseError) -> Self {
        TenancyError::Store(err.to_string())
    }
}
