use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{identify_caller_middleware, resolve_host_middleware};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        // Tenant-aware routes
        .merge(tenant_routes(state.clone()));

    // Global middleware
    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security));
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

/// Routes that see the Host-resolved tenant and an optional session.
///
/// Public lookups tolerate anonymous callers; every record route extracts a
/// `TenantScope`, which rejects them.
fn tenant_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Public
        .route("/auth/login", post(public::login::login))
        .route(
            "/api/tenants",
            get(public::tenants::lookup).post(elevated::tenants::create),
        )
        .route("/api/tenants/current", get(public::tenants::current))
        // Protected
        .route("/api/auth/whoami", get(protected::whoami::whoami))
        .route(
            "/api/:entity",
            get(protected::records::list).post(protected::records::create),
        )
        .route(
            "/api/:entity/:id",
            get(protected::records::get)
                .patch(protected::records::update)
                .delete(protected::records::delete),
        )
        .route_layer(from_fn_with_state(state.clone(), identify_caller_middleware))
        .route_layer(from_fn_with_state(state, resolve_host_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
