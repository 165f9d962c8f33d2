use std::time::Duration;

use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod services;

// Routing segregated by access level (Public, Authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

use config::CorsConfig;

/// ApiDoc
///
/// The OpenAPI document served at `/api-docs/openapi.json` and rendered by the
/// Swagger UI. Generic envelope bodies are collected from the handler annotations.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::logout, handlers::renew_tokens,
        handlers::get_authors, handlers::get_all_authors, handlers::get_author,
        handlers::create_author, handlers::update_author, handlers::delete_author
    ),
    components(
        schemas(
            models::SignIn, models::RenewRequest, models::TokenPair, models::UserResponse,
            models::Author, models::AuthorSummary, models::AuthorRequest,
            pagination::Metadata,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Sessions and token renewal"),
        (name = "authors", description = "Author records")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected operations.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// The single immutable container shared by every request: the persistence layer and
/// the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors such as `AuthUser` pull just the component they need.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards `authenticated_routes`. Resolving `AuthUser` validates the bearer token and
/// its owner; a failure rejects the request with the extractor's 401 before the
/// handler runs. On success the identity is stored in the request extensions so
/// handlers extracting `AuthUser` do not repeat the lookup.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Assembles the full routing tree, scoped and global middleware, and the shared state.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);
    let timeout = Duration::from_secs(state.config.server.read_timeout_secs);

    let x_request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        );

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // GET /health
        // Liveness probe for load balancers; never touches the database.
        .route("/health", get(|| async { "ok" }))
        .nest("/api/v1", api)
        .fallback(handlers::not_found)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id))
                // Slow requests are answered with 408 Request Timeout.
                .layer(TimeoutLayer::new(timeout)),
        )
        .layer(cors)
}

/// cors_layer
///
/// Builds the CORS policy from configuration. An empty list or `*` means "any". Browsers
/// refuse wildcards on credentialed requests, so with credentials enabled the wildcard
/// becomes a mirror of the request's own origin, method and headers.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    fn is_wildcard(values: &[String]) -> bool {
        values.is_empty() || values.iter().any(|value| value == "*")
    }

    let origin = if !is_wildcard(&config.allowed_origins) {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    } else if config.allow_credentials {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::from(Any)
    };

    let methods = if !is_wildcard(&config.allowed_methods) {
        AllowMethods::list(
            config
                .allowed_methods
                .iter()
                .filter_map(|method| Method::from_bytes(method.to_uppercase().as_bytes()).ok()),
        )
    } else if config.allow_credentials {
        AllowMethods::mirror_request()
    } else {
        AllowMethods::from(Any)
    };

    let headers = if !is_wildcard(&config.allowed_headers) {
        AllowHeaders::list(
            config
                .allowed_headers
                .iter()
                .filter_map(|name| HeaderName::from_bytes(name.as_bytes()).ok()),
        )
    } else if config.allow_credentials {
        AllowHeaders::mirror_request()
    } else {
        AllowHeaders::from(Any)
    };

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(config.allow_credentials);

    match config.max_age_secs {
        Some(secs) => cors.max_age(Duration::from_secs(secs)),
        None => cors,
    }
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: every log line of a request carries its method, URI
/// and `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
