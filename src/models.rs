use axum::{
    Json,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::pagination::PageRequest;

/// Longest accepted author name, mirroring the `VARCHAR(255)` column.
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_ADDRESS_LEN: usize = 1024;

const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page a listing will serve; `ignorePaging` is the way to get everything.
pub const MAX_PAGE_SIZE: u32 = 1000;

// --- Response Envelope ---

/// ApiResponse
///
/// The envelope wrapped around every JSON body this API returns.
/// Absent fields are omitted rather than serialized as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }

    /// Success without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    /// A failure reported through `message` (business outcome, e.g. "not found").
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    /// A failure reported through `error` (malformed input, auth, server faults).
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// --- Users & Authentication ---

/// User
///
/// Canonical row of the `users` table. Holds the password hash, so it is never
/// serialized directly; handlers answer with `UserResponse` instead.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    // Argon2 PHC string.
    pub password: String,
    pub role_id: String,
    pub status: i32,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
    pub is_deleted: bool,
}

/// UserResponse
///
/// Public projection of a `User`, without credentials.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role_id: String,
    pub status: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role_id: user.role_id,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Insert payload for `Repository::create_user`. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: String,
}

/// SignIn
///
/// Body of `POST /user/login`. `username` matches either the username or the email column.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SignIn {
    #[schema(example = "admin@example.com")]
    pub username: String,
    pub password: String,
}

impl SignIn {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::Empty { field: "username" });
        }
        if self.password.is_empty() {
            return Err(ValidationError::Empty { field: "password" });
        }
        Ok(())
    }
}

/// Body of `POST /token/renew`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RenewRequest {
    pub refresh_token: String,
}

/// TokenPair
///
/// Freshly issued bearer credentials.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh: String,
}

/// Payload returned by login and renew.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthPayload {
    pub user: UserResponse,
    pub token: TokenPair,
}

// --- Authors ---

/// Author
///
/// A row of the `authors` table. Deletion only flips `is_deleted`; every read path
/// filters on it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
    pub is_deleted: bool,
}

impl Author {
    /// Binds a creation request: new id, creation audit fields, never deleted.
    pub fn from_request(req: AuthorRequest, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            address: req.address,
            created_at: Utc::now(),
            created_by: Some(user_id),
            updated_at: None,
            updated_by: None,
            is_deleted: false,
        }
    }

    /// Binds an update request onto an existing row. Creation fields are untouched.
    pub fn apply(&mut self, req: AuthorRequest, user_id: Uuid) {
        self.name = req.name.trim().to_string();
        self.address = req.address;
        self.updated_at = Some(Utc::now());
        self.updated_by = Some(user_id);
    }

    pub fn soft_delete(&mut self, user_id: Uuid) {
        self.is_deleted = true;
        self.updated_at = Some(Utc::now());
        self.updated_by = Some(user_id);
    }
}

/// AuthorSummary
///
/// Lightweight projection served by `GET /authors/all`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[ts(export)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
}

impl From<&Author> for AuthorSummary {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            name: author.name.clone(),
            address: author.address.clone(),
        }
    }
}

/// AuthorRequest
///
/// Body of `POST /author` and `PUT /author/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthorRequest {
    #[schema(example = "Pramoedya Ananta Toer")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl AuthorRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_LEN,
            });
        }
        if let Some(address) = &self.address
            && address.chars().count() > MAX_ADDRESS_LEN
        {
            return Err(ValidationError::TooLong {
                field: "address",
                max: MAX_ADDRESS_LEN,
            });
        }
        Ok(())
    }
}

// --- Listing Parameters ---

/// StandardRequest
///
/// Raw query string of `GET /authors`. Everything is optional here; `into_query`
/// applies defaults and validation.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StandardRequest {
    /// Case-insensitive match against name and address.
    #[serde(alias = "q")]
    pub keyword: Option<String>,
    /// 1-based page number (default 1).
    pub page_number: Option<u32>,
    /// Rows per page (default 10).
    pub page_size: Option<u32>,
    /// One of id, name, address, createdAt, updatedAt, isDeleted (default createdAt).
    pub sort_by: Option<String>,
    /// asc or desc, any case (default DESC).
    pub sort_type: Option<String>,
    /// Inclusive lower bound on the creation date, YYYY-MM-DD.
    pub start_date: Option<String>,
    /// Inclusive upper bound on the creation date, YYYY-MM-DD.
    pub end_date: Option<String>,
    /// Return every match on a single page.
    pub ignore_paging: Option<bool>,
}

/// Whitelisted sort keys. Only these ever reach an `ORDER BY` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    Address,
    CreatedAt,
    UpdatedAt,
    IsDeleted,
}

impl SortColumn {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "address" => Some(Self::Address),
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "isDeleted" | "is_deleted" => Some(Self::IsDeleted),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Address => "address",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::IsDeleted => "is_deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" | "ASC" => Some(Self::Asc),
            "desc" | "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// AuthorQuery
///
/// A validated `StandardRequest`, ready for the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorQuery {
    pub keyword: Option<String>,
    /// Inclusive.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive.
    pub created_before: Option<DateTime<Utc>>,
    pub sort_by: SortColumn,
    pub sort_direction: SortDirection,
    /// `None` when paging is ignored.
    pub page: Option<PageRequest>,
}

impl StandardRequest {
    pub fn into_query(self) -> Result<AuthorQuery, ValidationError> {
        let page_number = self.page_number.unwrap_or(1);
        if page_number < 1 {
            return Err(ValidationError::OutOfRange {
                field: "pageNumber",
                min: 1,
            });
        }
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size < 1 {
            return Err(ValidationError::OutOfRange {
                field: "pageSize",
                min: 1,
            });
        }
        if page_size > MAX_PAGE_SIZE {
            return Err(ValidationError::TooLarge {
                field: "pageSize",
                max: MAX_PAGE_SIZE,
            });
        }

        let sort_by = match self.sort_by.as_deref() {
            None | Some("") => SortColumn::CreatedAt,
            Some(raw) => SortColumn::parse(raw).ok_or_else(|| ValidationError::InvalidVariant {
                field: "sortBy",
                value: raw.to_string(),
            })?,
        };
        let sort_direction = match self.sort_type.as_deref() {
            None | Some("") => SortDirection::Desc,
            Some(raw) => {
                SortDirection::parse(raw).ok_or_else(|| ValidationError::InvalidVariant {
                    field: "sortType",
                    value: raw.to_string(),
                })?
            }
        };

        let start = parse_date("startDate", self.start_date.as_deref())?;
        let end = parse_date("endDate", self.end_date.as_deref())?;
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(ValidationError::InvalidFormat {
                field: "startDate",
                reason: "must not be after endDate",
            });
        }

        let keyword = self
            .keyword
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let page = if self.ignore_paging.unwrap_or(false) {
            None
        } else {
            let page = PageRequest::new(page_number, page_size);
            if page.checked_offset().is_none() {
                return Err(ValidationError::InvalidFormat {
                    field: "pageNumber",
                    reason: "page lies beyond the last addressable row",
                });
            }
            Some(page)
        };

        Ok(AuthorQuery {
            keyword,
            created_from: start.map(start_of_day),
            created_before: end.and_then(|d| d.succ_opt()).map(start_of_day),
            sort_by,
            sort_direction,
            page,
        })
    }
}

fn parse_date(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ValidationError::InvalidFormat {
                field,
                reason: "expected YYYY-MM-DD",
            }),
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

// --- Validation ---

/// ValidationError
///
/// Field-level input violations. Always rendered as 400.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field}: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    #[error("invalid {field} value: '{value}'")]
    InvalidVariant { field: &'static str, value: String },

    #[error("{field} must be at least {min}")]
    OutOfRange { field: &'static str, min: u32 },

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_request() {
        let query = StandardRequest::default().into_query().unwrap();
        assert_eq!(query.sort_by, SortColumn::CreatedAt);
        assert_eq!(query.sort_direction, SortDirection::Desc);
        assert_eq!(query.page, Some(PageRequest::new(1, DEFAULT_PAGE_SIZE)));
        assert!(query.keyword.is_none());
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let req = StandardRequest {
            page_size: Some(0),
            ..Default::default()
        };
        assert_eq!(
            req.into_query().unwrap_err(),
            ValidationError::OutOfRange {
                field: "pageSize",
                min: 1
            }
        );
    }

    #[test]
    fn oversized_page_is_rejected() {
        let req = StandardRequest {
            page_number: Some(u32::MAX),
            page_size: Some(u32::MAX),
            ..Default::default()
        };
        assert_eq!(
            req.into_query().unwrap_err(),
            ValidationError::TooLarge {
                field: "pageSize",
                max: MAX_PAGE_SIZE
            }
        );

        let last = StandardRequest {
            page_number: Some(u32::MAX),
            page_size: Some(MAX_PAGE_SIZE),
            ..Default::default()
        }
        .into_query()
        .unwrap();
        assert!(last.page.unwrap().offset() > 0);
    }

    #[test]
    fn unknown_sort_column_is_rejected() {
        let req = StandardRequest {
            sort_by: Some("password".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            req.into_query(),
            Err(ValidationError::InvalidVariant { field: "sortBy", .. })
        ));
    }

    #[test]
    fn sort_type_accepts_both_cases_only() {
        assert_eq!(SortDirection::parse("asc"), Some(SortDirection::Asc));
        assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::parse("Desc"), None);
    }

    #[test]
    fn date_range_is_inclusive_of_end_day() {
        let req = StandardRequest {
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-31".to_string()),
            ..Default::default()
        };
        let query = req.into_query().unwrap();
        assert_eq!(
            query.created_from.unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
        assert_eq!(
            query.created_before.unwrap().to_rfc3339(),
            "2024-02-01T00:00:00+00:00"
        );
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let req = StandardRequest {
            start_date: Some("2024-02-01".to_string()),
            end_date: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        assert!(req.into_query().is_err());
    }

    #[test]
    fn blank_keyword_is_dropped() {
        let req = StandardRequest {
            keyword: Some("   ".to_string()),
            ignore_paging: Some(true),
            ..Default::default()
        };
        let query = req.into_query().unwrap();
        assert!(query.keyword.is_none());
        assert!(query.page.is_none());
    }

    #[test]
    fn author_name_length_is_checked_in_characters() {
        let ok = AuthorRequest {
            name: "é".repeat(MAX_NAME_LEN),
            address: None,
        };
        assert!(ok.validate().is_ok());

        let too_long = AuthorRequest {
            name: "a".repeat(MAX_NAME_LEN + 1),
            address: None,
        };
        assert_eq!(
            too_long.validate().unwrap_err(),
            ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_LEN
            }
        );
    }

    #[test]
    fn update_keeps_creation_fields() {
        let creator = Uuid::new_v4();
        let editor = Uuid::new_v4();
        let mut author = Author::from_request(
            AuthorRequest {
                name: " Ada ".to_string(),
                address: None,
            },
            creator,
        );
        let created_at = author.created_at;
        assert_eq!(author.name, "Ada");
        assert!(author.updated_at.is_none());

        author.apply(
            AuthorRequest {
                name: "Ada Lovelace".to_string(),
                address: Some("London".to_string()),
            },
            editor,
        );
        assert_eq!(author.created_by, Some(creator));
        assert_eq!(author.created_at, created_at);
        assert_eq!(author.updated_by, Some(editor));
        assert!(author.updated_at.is_some());

        author.soft_delete(editor);
        assert!(author.is_deleted);
    }
}
