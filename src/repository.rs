use std::{
    cmp::Ordering,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering as AtomicOrdering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{
    Author, AuthorQuery, AuthorSummary, NewUser, SortColumn, SortDirection, User,
};

pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Repository Trait
///
/// The persistence contract used by services. Handlers never see SQL; tests swap in
/// `InMemoryRepository`.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across
/// Axum's request tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    /// Looks a live user up by username or email.
    async fn find_user_by_login(&self, login: &str) -> RepoResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;

    // --- Authors ---
    /// Returns one page of live authors matching `query` plus the total match count.
    async fn search_authors(&self, query: &AuthorQuery) -> RepoResult<(Vec<Author>, i64)>;
    /// Every live author, ordered by name.
    async fn list_active_authors(&self) -> RepoResult<Vec<AuthorSummary>>;
    /// A live author by id; soft-deleted rows are invisible.
    async fn find_author(&self, id: Uuid) -> RepoResult<Option<Author>>;
    async fn insert_author(&self, author: &Author) -> RepoResult<Author>;
    /// Writes name, address and the update audit fields of a live author.
    /// `None` when the row is gone or already deleted.
    async fn update_author(&self, author: &Author) -> RepoResult<Option<Author>>;
    /// Flags a live author as deleted. `false` when there was nothing to delete.
    async fn soft_delete_author(&self, id: Uuid, user_id: Uuid) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, username, email, password, role_id, status, created_at, \
                            created_by, updated_at, updated_by, is_deleted";
const AUTHOR_COLUMNS: &str =
    "id, name, address, created_at, created_by, updated_at, updated_by, is_deleted";

/// PostgresRepository
///
/// The `Repository` backed by PostgreSQL through a shared connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends the WHERE conditions shared by the count and the page query.
/// Every value is bound; nothing from the request is spliced into the SQL text.
fn push_author_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &AuthorQuery) {
    builder.push(" WHERE is_deleted = false");

    if let Some(keyword) = &query.keyword {
        builder.push(" AND concat(name, address) ILIKE ");
        builder.push_bind(format!("%{}%", escape_like(keyword)));
    }
    if let Some(from) = query.created_from {
        builder.push(" AND created_at >= ");
        builder.push_bind(from);
    }
    if let Some(before) = query.created_before {
        builder.push(" AND created_at < ");
        builder.push_bind(before);
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_user_by_login(&self, login: &str) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE (username = $1 OR email = $1) AND is_deleted = false \
             ORDER BY created_at ASC LIMIT 1"
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, email, password, role_id, status, created_at, is_deleted) \
             VALUES ($1, $2, $3, $4, $5, 1, NOW(), false) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.role_id)
        .fetch_one(&self.pool)
        .await
    }

    /// search_authors
    ///
    /// Runs a COUNT first and skips the page query when nothing matches. The sort column
    /// comes from the closed `SortColumn` enum; `id` breaks ties so pages are stable.
    async fn search_authors(&self, query: &AuthorQuery) -> RepoResult<(Vec<Author>, i64)> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(id) FROM authors");
        push_author_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        if total < 1 {
            return Ok((Vec::new(), 0));
        }

        let mut select: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {AUTHOR_COLUMNS} FROM authors"));
        push_author_filters(&mut select, query);
        select.push(format!(
            " ORDER BY {} {}, id ASC",
            query.sort_by.column(),
            query.sort_direction.sql()
        ));
        if let Some(page) = query.page {
            select.push(" LIMIT ");
            select.push_bind(page.limit());
            select.push(" OFFSET ");
            select.push_bind(page.offset());
        }

        let items = select
            .build_query_as::<Author>()
            .fetch_all(&self.pool)
            .await?;
        Ok((items, total))
    }

    async fn list_active_authors(&self) -> RepoResult<Vec<AuthorSummary>> {
        sqlx::query_as::<_, AuthorSummary>(
            "SELECT id, name, address FROM authors WHERE is_deleted = false ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn find_author(&self, id: Uuid) -> RepoResult<Option<Author>> {
        sqlx::query_as::<_, Author>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = $1 AND is_deleted = false"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert_author(&self, author: &Author) -> RepoResult<Author> {
        sqlx::query_as::<_, Author>(&format!(
            "INSERT INTO authors (id, name, address, created_at, created_by, updated_at, updated_by, is_deleted) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {AUTHOR_COLUMNS}"
        ))
        .bind(author.id)
        .bind(&author.name)
        .bind(&author.address)
        .bind(author.created_at)
        .bind(author.created_by)
        .bind(author.updated_at)
        .bind(author.updated_by)
        .bind(author.is_deleted)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_author(&self, author: &Author) -> RepoResult<Option<Author>> {
        sqlx::query_as::<_, Author>(&format!(
            "UPDATE authors \
             SET name = $2, address = $3, updated_at = $4, updated_by = $5 \
             WHERE id = $1 AND is_deleted = false \
             RETURNING {AUTHOR_COLUMNS}"
        ))
        .bind(author.id)
        .bind(&author.name)
        .bind(&author.address)
        .bind(author.updated_at)
        .bind(author.updated_by)
        .fetch_optional(&self.pool)
        .await
    }

    async fn soft_delete_author(&self, id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE authors SET is_deleted = true, updated_at = NOW(), updated_by = $2 \
             WHERE id = $1 AND is_deleted = false",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// InMemoryRepository
///
/// A `Repository` over in-process vectors with the same visibility, filtering, sorting
/// and paging rules as the Postgres implementation (except that `None` sorts first).
/// `set_unavailable(true)` makes every call fail like a lost database connection.
#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<Vec<User>>,
    authors: RwLock<Vec<Author>>,
    unavailable: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, user: User) {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(user);
    }

    /// Stores the row verbatim, deleted or not.
    pub fn seed_author(&self, author: Author) {
        self.authors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(author);
    }

    /// Snapshot of every stored author, soft-deleted rows included.
    pub fn authors(&self) -> Vec<Author> {
        self.authors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    fn check_available(&self) -> RepoResult<()> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            Ok(())
        }
    }
}

fn matches_query(author: &Author, query: &AuthorQuery) -> bool {
    if author.is_deleted {
        return false;
    }
    if let Some(keyword) = &query.keyword {
        let haystack = format!("{}{}", author.name, author.address.as_deref().unwrap_or(""));
        if !haystack.to_lowercase().contains(&keyword.to_lowercase()) {
            return false;
        }
    }
    if query.created_from.is_some_and(|from| author.created_at < from) {
        return false;
    }
    if query
        .created_before
        .is_some_and(|before| author.created_at >= before)
    {
        return false;
    }
    true
}

fn compare_by(a: &Author, b: &Author, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Id => a.id.cmp(&b.id),
        SortColumn::Name => a.name.cmp(&b.name),
        SortColumn::Address => a.address.cmp(&b.address),
        SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
        SortColumn::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortColumn::IsDeleted => a.is_deleted.cmp(&b.is_deleted),
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        self.check_available()?;
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_login(&self, login: &str) -> RepoResult<Option<User>> {
        self.check_available()?;
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users
            .iter()
            .find(|u| !u.is_deleted && (u.username == login || u.email == login))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        self.check_available()?;
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password: user.password_hash,
            role_id: user.role_id,
            status: 1,
            created_at: Utc::now(),
            ..User::default()
        };
        self.seed_user(created.clone());
        Ok(created)
    }

    async fn search_authors(&self, query: &AuthorQuery) -> RepoResult<(Vec<Author>, i64)> {
        self.check_available()?;
        let authors = self.authors.read().unwrap_or_else(PoisonError::into_inner);

        let mut matched: Vec<Author> = authors
            .iter()
            .filter(|a| matches_query(a, query))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            let primary = compare_by(a, b, query.sort_by);
            let primary = match query.sort_direction {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });

        let total = i64::try_from(matched.len()).unwrap_or(i64::MAX);
        let items = match query.page {
            Some(page) => matched
                .into_iter()
                .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
                .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
                .collect(),
            None => matched,
        };
        Ok((items, total))
    }

    async fn list_active_authors(&self) -> RepoResult<Vec<AuthorSummary>> {
        self.check_available()?;
        let authors = self.authors.read().unwrap_or_else(PoisonError::into_inner);
        let mut summaries: Vec<AuthorSummary> = authors
            .iter()
            .filter(|a| !a.is_deleted)
            .map(AuthorSummary::from)
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    async fn find_author(&self, id: Uuid) -> RepoResult<Option<Author>> {
        self.check_available()?;
        let authors = self.authors.read().unwrap_or_else(PoisonError::into_inner);
        Ok(authors
            .iter()
            .find(|a| a.id == id && !a.is_deleted)
            .cloned())
    }

    async fn insert_author(&self, author: &Author) -> RepoResult<Author> {
        self.check_available()?;
        self.seed_author(author.clone());
        Ok(author.clone())
    }

    async fn update_author(&self, author: &Author) -> RepoResult<Option<Author>> {
        self.check_available()?;
        let mut authors = self.authors.write().unwrap_or_else(PoisonError::into_inner);
        let Some(stored) = authors
            .iter_mut()
            .find(|a| a.id == author.id && !a.is_deleted)
        else {
            return Ok(None);
        };

        stored.name = author.name.clone();
        stored.address = author.address.clone();
        stored.updated_at = author.updated_at;
        stored.updated_by = author.updated_by;
        Ok(Some(stored.clone()))
    }

    async fn soft_delete_author(&self, id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        self.check_available()?;
        let mut authors = self.authors.write().unwrap_or_else(PoisonError::into_inner);
        match authors.iter_mut().find(|a| a.id == id && !a.is_deleted) {
            Some(stored) => {
                stored.soft_delete(user_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
