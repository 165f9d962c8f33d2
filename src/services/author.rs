use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    models::{Author, AuthorRequest, AuthorSummary, StandardRequest},
    pagination::Paginated,
    repository::Repository,
};

pub const NOT_FOUND_BY_ID: &str = "Data with the given ID is not found";
pub const NOT_FOUND_FOR_WRITE: &str = "Data with this ID not found";

/// resolve_all
///
/// Validates the listing parameters, runs the search and wraps the page with its
/// navigation metadata. With paging ignored the whole result is one page.
pub async fn resolve_all(
    repo: &dyn Repository,
    req: StandardRequest,
) -> ApiResult<Paginated<Author>> {
    let query = req.into_query()?;
    let (items, total) = repo.search_authors(&query).await?;

    tracing::debug!(total, returned = items.len(), "author search");

    Ok(match query.page {
        Some(page) => Paginated::new(items, total, page),
        None => Paginated::single_page(items),
    })
}

pub async fn get_all(repo: &dyn Repository) -> ApiResult<Vec<AuthorSummary>> {
    Ok(repo.list_active_authors().await?)
}

pub async fn find_by_id(repo: &dyn Repository, id: Uuid) -> ApiResult<Author> {
    repo.find_author(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND_BY_ID.to_string()))
}

pub async fn create(repo: &dyn Repository, caller: &AuthUser, req: AuthorRequest) -> ApiResult<Author> {
    req.validate()?;

    let author = repo
        .insert_author(&Author::from_request(req, caller.id))
        .await?;
    tracing::info!(
        author_id = %author.id,
        user_id = %caller.id,
        role = %caller.role,
        "author created"
    );
    Ok(author)
}

/// update
///
/// Validation runs before any lookup, so a bad body never reaches the repository.
pub async fn update(
    repo: &dyn Repository,
    caller: &AuthUser,
    id: Uuid,
    req: AuthorRequest,
) -> ApiResult<Author> {
    req.validate()?;

    let mut author = repo
        .find_author(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND_FOR_WRITE.to_string()))?;
    author.apply(req, caller.id);

    // The row may have been deleted between the lookup and the write.
    let saved = repo
        .update_author(&author)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND_FOR_WRITE.to_string()))?;
    tracing::info!(
        author_id = %saved.id,
        user_id = %caller.id,
        role = %caller.role,
        "author updated"
    );
    Ok(saved)
}

pub async fn delete(repo: &dyn Repository, caller: &AuthUser, id: Uuid) -> ApiResult<()> {
    if !repo.soft_delete_author(id, caller.id).await? {
        return Err(ApiError::NotFound(NOT_FOUND_FOR_WRITE.to_string()));
    }

    tracing::info!(
        author_id = %id,
        user_id = %caller.id,
        role = %caller.role,
        "author soft-deleted"
    );
    Ok(())
}
