use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token: signing in and read-only author lookups.
/// Soft-deleted authors stay invisible here because every repository read filters them.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // POST /user/login
        .route("/user/login", post(handlers::login))
        // GET /authors/all
        // Unpaged summary list for pickers and dropdowns.
        .route("/authors/all", get(handlers::get_all_authors))
        // GET /author/{id}
        .route("/author/{id}", get(handlers::get_author))
}
