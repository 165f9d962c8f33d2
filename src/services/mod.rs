//! Business logic between the HTTP handlers and the `Repository`.
//!
//! Services take the repository as `&dyn Repository` and return `ApiResult`, so the
//! same calls run against Postgres in production and the in-memory store in tests.

pub mod auth;
pub mod author;
