//! Exercises `PostgresRepository` against a real database.
//!
//! Run with `DATABASE_URL` pointing at a disposable Postgres and `--ignored`. Every test
//! tags its rows with a fresh marker so concurrent tests and leftovers never interfere.

use authors_api::{
    models::{Author, AuthorRequest, NewUser, StandardRequest, User},
    pagination::PageRequest,
    repository::{PostgresRepository, Repository},
};
use chrono::{Duration, TimeZone, Utc};
use sqlx::PgPool;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

fn marker() -> String {
    format!("t{}", Uuid::new_v4().simple())
}

async fn create_test_user(repo: &PostgresRepository, marker: &str) -> User {
    repo.create_user(NewUser {
        username: format!("user-{marker}"),
        email: format!("{marker}@test.com"),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        role_id: "user".to_string(),
    })
    .await
    .expect("Failed to create test user")
}

async fn create_test_author(
    repo: &PostgresRepository,
    user: &User,
    name: &str,
    created_at: chrono::DateTime<Utc>,
) -> Author {
    let mut author = Author::from_request(
        AuthorRequest {
            name: name.to_string(),
            address: None,
        },
        user.id,
    );
    author.created_at = created_at;
    repo.insert_author(&author)
        .await
        .expect("Failed to insert author")
}

fn search(keyword: &str) -> StandardRequest {
    StandardRequest {
        keyword: Some(keyword.to_string()),
        ..Default::default()
    }
}

// --- Tests ---

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_lookup_by_username_or_email() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let tag = marker();
    let user = create_test_user(&repo, &tag).await;

    let by_name = repo
        .find_user_by_login(&format!("user-{tag}"))
        .await
        .unwrap()
        .unwrap();
    let by_email = repo
        .find_user_by_login(&format!("{tag}@test.com"))
        .await
        .unwrap()
        .unwrap();
    let by_id = repo.get_user(user.id).await.unwrap().unwrap();

    assert_eq!(by_name.id, user.id);
    assert_eq!(by_email.id, user.id);
    assert_eq!(by_id.email, user.email);
    assert!(repo.find_user_by_login("no-such-user").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_search_filters_sorts_and_pages() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let tag = marker();
    let user = create_test_user(&repo, &tag).await;

    let base = Utc.with_ymd_and_hms(2023, 6, 1, 9, 0, 0).unwrap();
    for i in 0..5 {
        create_test_author(&repo, &user, &format!("{tag} {i}"), base + Duration::days(i)).await;
    }

    let mut query = StandardRequest {
        sort_by: Some("createdAt".to_string()),
        sort_type: Some("asc".to_string()),
        ..search(&tag)
    }
    .into_query()
    .unwrap();
    query.page = Some(PageRequest::new(2, 2));

    let (items, total) = repo.search_authors(&query).await.unwrap();
    assert_eq!(total, 5);
    let names: Vec<_> = items.iter().map(|a| a.name.clone()).collect();
    assert_eq!(names, [format!("{tag} 2"), format!("{tag} 3")]);

    let ranged = StandardRequest {
        start_date: Some("2023-06-02".to_string()),
        end_date: Some("2023-06-03".to_string()),
        ..search(&tag)
    }
    .into_query()
    .unwrap();
    let (_, total) = repo.search_authors(&ranged).await.unwrap();
    assert_eq!(total, 2);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_keyword_wildcards_are_literal() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let tag = marker();
    let user = create_test_user(&repo, &tag).await;
    create_test_author(&repo, &user, &format!("{tag} plain"), Utc::now()).await;

    let query = search(&format!("{tag}%")).into_query().unwrap();
    let (_, total) = repo.search_authors(&query).await.unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_and_soft_delete() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let tag = marker();
    let user = create_test_user(&repo, &tag).await;
    let mut author = create_test_author(&repo, &user, &format!("{tag} before"), Utc::now()).await;

    author.apply(
        AuthorRequest {
            name: format!("{tag} after"),
            address: Some("Somewhere".to_string()),
        },
        user.id,
    );
    let updated = repo.update_author(&author).await.unwrap().unwrap();
    assert_eq!(updated.name, format!("{tag} after"));
    assert_eq!(updated.updated_by, Some(user.id));
    assert_eq!(updated.created_by, Some(user.id));

    assert!(repo.soft_delete_author(author.id, user.id).await.unwrap());
    assert!(!repo.soft_delete_author(author.id, user.id).await.unwrap());
    assert!(repo.find_author(author.id).await.unwrap().is_none());
    assert!(repo.update_author(&author).await.unwrap().is_none());

    let (_, total) = repo
        .search_authors(&search(&tag).into_query().unwrap())
        .await
        .unwrap();
    assert_eq!(total, 0);

    let listed = repo.list_active_authors().await.unwrap();
    assert!(listed.iter().all(|a| a.id != author.id));

    // The row itself survives with its audit trail.
    let (is_deleted, updated_by): (bool, Option<Uuid>) =
        sqlx::query_as("SELECT is_deleted, updated_by FROM authors WHERE id = $1")
            .bind(author.id)
            .fetch_one(&ctx.pool)
            .await
            .unwrap();
    assert!(is_deleted);
    assert_eq!(updated_by, Some(user.id));
}
