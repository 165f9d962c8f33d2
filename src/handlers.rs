use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    models::{
        ApiResponse, AuthPayload, Author, AuthorRequest, AuthorSummary, RenewRequest, SignIn,
        StandardRequest,
    },
    pagination::Paginated,
    services,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

pub const NOT_FOUND_ROUTE: &str = "sorry, endpoint is not found";

// --- Authentication ---

/// login
///
/// [Public Route] Exchanges a username (or email) and password for a token pair.
#[utoipa::path(
    post,
    path = "/api/v1/user/login",
    tag = "auth",
    request_body = SignIn,
    responses(
        (status = 200, description = "Signed in", body = ApiResponse<AuthPayload>),
        (status = 400, description = "Malformed body or wrong password"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignIn>,
) -> ApiResult<ApiResponse<AuthPayload>> {
    let auth = services::auth::login(state.repo.as_ref(), &state.config.jwt, payload).await?;
    Ok(ApiResponse::ok(auth))
}

/// logout
///
/// [Authenticated Route] Ends the session on the client side. Tokens are stateless,
/// so nothing is revoked server-side.
#[utoipa::path(
    post,
    path = "/api/v1/user/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn logout(user: AuthUser) -> StatusCode {
    tracing::info!(user_id = %user.id, "user logged out");
    StatusCode::NO_CONTENT
}

/// renew_tokens
///
/// [Authenticated Route] Issues a new token pair from a live refresh token that
/// belongs to the caller.
#[utoipa::path(
    post,
    path = "/api/v1/token/renew",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = RenewRequest,
    responses(
        (status = 200, description = "Tokens renewed", body = ApiResponse<AuthPayload>),
        (status = 400, description = "Malformed refresh token"),
        (status = 401, description = "Expired session or foreign refresh token"),
        (status = 404, description = "User no longer exists")
    )
)]
pub async fn renew_tokens(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RenewRequest>,
) -> ApiResult<ApiResponse<AuthPayload>> {
    let auth =
        services::auth::renew(state.repo.as_ref(), &state.config.jwt, &user, payload).await?;
    Ok(ApiResponse::ok(auth))
}

// --- Authors ---

/// get_authors
///
/// [Authenticated Route] Searches live authors with keyword, date range, sorting
/// and paging.
#[utoipa::path(
    get,
    path = "/api/v1/authors",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(StandardRequest),
    responses(
        (status = 200, description = "One page of authors", body = ApiResponse<Paginated<Author>>),
        (status = 400, description = "Invalid listing parameters"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_authors(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<StandardRequest>,
) -> ApiResult<ApiResponse<Paginated<Author>>> {
    let page = services::author::resolve_all(state.repo.as_ref(), params).await?;
    Ok(ApiResponse::ok(page))
}

/// get_all_authors
///
/// [Public Route] Every live author as an id/name/address summary, ordered by name.
#[utoipa::path(
    get,
    path = "/api/v1/authors/all",
    tag = "authors",
    responses((status = 200, description = "All authors", body = ApiResponse<Vec<AuthorSummary>>))
)]
pub async fn get_all_authors(
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<Vec<AuthorSummary>>> {
    let authors = services::author::get_all(state.repo.as_ref()).await?;
    Ok(ApiResponse::ok(authors))
}

/// get_author
///
/// [Public Route] A single live author.
#[utoipa::path(
    get,
    path = "/api/v1/author/{id}",
    tag = "authors",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Found", body = ApiResponse<Author>),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Unknown or deleted author")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Author>> {
    let author = services::author::find_by_id(state.repo.as_ref(), id).await?;
    Ok(ApiResponse::ok(author))
}

/// create_author
///
/// [Authenticated Route] Records a new author; the caller becomes `createdBy`.
#[utoipa::path(
    post,
    path = "/api/v1/author",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = AuthorRequest,
    responses(
        (status = 200, description = "Create data successfully", body = ApiResponse<Author>),
        (status = 400, description = "Invalid body"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn create_author(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AuthorRequest>,
) -> ApiResult<ApiResponse<Author>> {
    let author = services::author::create(state.repo.as_ref(), &user, payload).await?;
    Ok(ApiResponse::with_message(author, "Create data successfully"))
}

/// update_author
///
/// [Authenticated Route] Replaces name and address of a live author.
/// Answers 201 on success, as existing clients expect.
#[utoipa::path(
    put,
    path = "/api/v1/author/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Author ID")),
    request_body = AuthorRequest,
    responses(
        (status = 201, description = "Update data successfully", body = ApiResponse<Author>),
        (status = 400, description = "Invalid body or id"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Unknown or deleted author")
    )
)]
pub async fn update_author(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AuthorRequest>,
) -> ApiResult<(StatusCode, ApiResponse<Author>)> {
    let author = services::author::update(state.repo.as_ref(), &user, id, payload).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(author, "Update data successfully"),
    ))
}

/// delete_author
///
/// [Authenticated Route] Soft-deletes a live author.
#[utoipa::path(
    delete,
    path = "/api/v1/author/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 201, description = "Delete data successfully"),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Unknown or deleted author")
    )
)]
pub async fn delete_author(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<(StatusCode, ApiResponse<()>)> {
    services::author::delete(state.repo.as_ref(), &user, id).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::message("Delete data successfully"),
    ))
}

// --- Fallback ---

pub async fn not_found() -> impl IntoResponse {
    ApiError::NotFound(NOT_FOUND_ROUTE.to_string())
}
