use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Endpoints that need a valid access token. The router returned here is wrapped in
/// `auth_middleware`, which resolves the `AuthUser` once per request; handlers that
/// take an `AuthUser` argument reuse that identity.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Session ---
        // POST /user/logout
        .route("/user/logout", post(handlers::logout))
        // POST /token/renew
        // The body's refresh token must belong to the bearer of the access token.
        .route("/token/renew", post(handlers::renew_tokens))
        // --- Authors ---
        // GET /authors?keyword=&pageNumber=&pageSize=&sortBy=&sortType=&startDate=&endDate=
        .route("/authors", get(handlers::get_authors))
        // POST /author
        .route("/author", post(handlers::create_author))
        // PUT/DELETE /author/{id}
        // GET on the same path is public and merged in from `public_routes`.
        .route(
            "/author/{id}",
            put(handlers::update_author).delete(handlers::delete_author),
        )
}
