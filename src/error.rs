// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::records::RecordError;
use crate::tenancy::TenancyError;

/// HTTP API error with a status code and a client-safe message
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError { message: String, field: Option<String> },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 422 Unprocessable Entity
    UnprocessableEntity(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::UnprocessableEntity(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::UnprocessableEntity(_) => "UNPROCESSABLE_ENTITY",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError { field: Some(field), .. } = self {
            body["field"] = json!(field);
        }
        body
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field: Option<String>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unprocessable_entity(message: impl Into<String>) -> Self {
        ApiError::UnprocessableEntity(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<TenancyError> for ApiError {
    fn from(err: TenancyError) -> Self {
        match err {
            TenancyError::NotFound(slug) => ApiError::not_found(format!("Tenant '{}' not found", slug)),
            TenancyError::MalformedHost(host) => ApiError::bad_request(format!("Malformed host '{}'", host)),
            TenancyError::Unauthenticated => ApiError::unauthorized("Authentication required"),
            TenancyError::UnknownTenant(msg) => {
                tracing::warn!("Tenant scope rejected: {}", msg);
                ApiError::forbidden("Tenant is not available to this session")
            }
            TenancyError::Forbidden(msg) => ApiError::forbidden(msg),
            TenancyError::SlugConflict(slug) => ApiError::conflict(format!("Slug '{}' is already taken", slug)),
            TenancyError::InvalidSlug(msg) => ApiError::validation_error(msg, Some("slug".to_string())),
            TenancyError::InvalidName(msg) => ApiError::validation_error(msg, Some("name".to_string())),
            TenancyError::Store(msg) => {
                // Don't expose internal store errors to clients
                tracing::error!("Tenant store error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::NotFound(msg) => ApiError::not_found(format!("Record not found: {}", msg)),
            RecordError::UnknownEntity(entity) => ApiError::not_found(format!("Unknown entity '{}'", entity)),
            e @ RecordError::UnknownColumn { .. } => ApiError::bad_request(e.to_string()),
            RecordError::SystemFieldNotAllowed(field) => ApiError::validation_error(
                format!("System field '{}' cannot be set via API", field),
                Some(field),
            ),
            RecordError::MissingRequiredField(field) => {
                ApiError::validation_error("Missing required fields", Some(field))
            }
            RecordError::Forbidden(msg) => ApiError::forbidden(msg),
            RecordError::TenantBypass { requested } => {
                tracing::warn!("Rejected request naming foreign tenant '{}'", requested);
                ApiError::forbidden("Request names a tenant outside the session scope")
            }
            e @ RecordError::CrossTenantReference { .. } => ApiError::unprocessable_entity(e.to_string()),
            RecordError::InvalidPayload(msg) => ApiError::bad_request(msg),
            RecordError::Store(msg) => {
                tracing::error!("Record store error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(msg) => ApiError::unauthorized(msg),
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid email or password"),
            AuthError::AccountDisabled => ApiError::forbidden("Account is disabled"),
            AuthError::MissingSecret | AuthError::TokenGeneration(_) | AuthError::Hashing(_) => {
                tracing::error!("Authentication failure: {}", err);
                ApiError::internal_server_error("Authentication is unavailable")
            }
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConfigMissing(_) => ApiError::service_unavailable("Database is not configured"),
            DatabaseError::MigrationError(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            DatabaseError::QueryError(msg) => {
                tracing::error!("Database query error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenancy_errors_map_to_statuses() {
        let cases = [
            (TenancyError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (TenancyError::MalformedHost("".into()), StatusCode::BAD_REQUEST),
            (TenancyError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (TenancyError::UnknownTenant("t9".into()), StatusCode::FORBIDDEN),
            (TenancyError::SlugConflict("alnoor".into()), StatusCode::CONFLICT),
            (TenancyError::InvalidSlug("bad".into()), StatusCode::BAD_REQUEST),
            (TenancyError::Store("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn invalid_tenant_input_names_the_offending_field() {
        let name = ApiError::from(TenancyError::InvalidName("tenant name is required".into())).to_json();
        assert_eq!(name["code"], "VALIDATION_ERROR");
        assert_eq!(name["field"], "name");

        let slug = ApiError::from(TenancyError::InvalidSlug("bad".into())).to_json();
        assert_eq!(slug["field"], "slug");
    }

    #[test]
    fn record_errors_map_to_statuses() {
        let bypass = ApiError::from(RecordError::TenantBypass { requested: "t2".into() });
        assert_eq!(bypass.status_code(), StatusCode::FORBIDDEN);

        let role = ApiError::from(RecordError::Forbidden("role 'teacher' may not create user accounts".into()));
        assert_eq!(role.status_code(), StatusCode::FORBIDDEN);

        let reference = ApiError::from(RecordError::CrossTenantReference {
            entity: "students",
            id: "s9".into(),
        });
        assert_eq!(reference.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let column = ApiError::from(RecordError::UnknownColumn {
            entity: "students",
            column: "colour".into(),
        });
        assert_eq!(column.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_details_are_not_exposed() {
        let err = ApiError::from(RecordError::Store("relation \"students\" does not exist".into()));
        assert_eq!(err.to_json()["message"], "An error occurred while processing your request");
        assert_eq!(err.to_json()["error"], true);
    }
}
