use chrono::Utc;

use crate::{
    auth::{AuthUser, decode_refresh_token, generate_tokens, hash_password, verify_password},
    config::{AppConfig, JwtConfig},
    error::{ApiError, ApiResult},
    models::{AuthPayload, NewUser, RenewRequest, SignIn, UserResponse, ValidationError},
    repository::Repository,
};

pub const USER_NOT_FOUND: &str = "user with the given email is not found";
pub const WRONG_CREDENTIALS: &str = "wrong user username address or password";
const USER_ID_NOT_FOUND: &str = "user with the given ID is not found";
const FOREIGN_REFRESH_TOKEN: &str = "refresh token was not issued for this user";
const ADMIN_ROLE: &str = "admin";

/// login
///
/// Resolves the account by username or email, checks the password and issues a fresh
/// token pair. An unknown account is a 404; a wrong password is a 400.
pub async fn login(repo: &dyn Repository, jwt: &JwtConfig, req: SignIn) -> ApiResult<AuthPayload> {
    req.validate()?;

    let user = repo
        .find_user_by_login(req.username.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

    if !verify_password(&req.password, &user.password) {
        tracing::info!(user_id = %user.id, "login rejected: wrong password");
        return Err(ApiError::Rejected(WRONG_CREDENTIALS.to_string()));
    }

    let token = generate_tokens(user.id, jwt)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(AuthPayload {
        user: UserResponse::from(user),
        token,
    })
}

/// renew
///
/// Exchanges a refresh token for a new pair. The caller is already authenticated by
/// its access token; the refresh token must belong to the same user and still be
/// within its lifetime.
pub async fn renew(
    repo: &dyn Repository,
    jwt: &JwtConfig,
    caller: &AuthUser,
    req: RenewRequest,
) -> ApiResult<AuthPayload> {
    let raw = req.refresh_token.trim();
    if raw.is_empty() {
        return Err(ValidationError::Empty {
            field: "refresh_token",
        }
        .into());
    }

    let claims = decode_refresh_token(raw, jwt).map_err(|e| {
        tracing::debug!(error = ?e, "malformed refresh token");
        ApiError::BadRequest(format!("invalid refresh token: {e}"))
    })?;

    if claims.sub != caller.id {
        tracing::warn!(caller = %caller.id, subject = %claims.sub, "refresh token subject mismatch");
        return Err(ApiError::Unauthorized(FOREIGN_REFRESH_TOKEN.to_string()));
    }
    if Utc::now().timestamp() >= claims.exp {
        return Err(ApiError::SessionEnded);
    }

    let user = repo
        .get_user(caller.id)
        .await?
        .filter(|user| !user.is_deleted)
        .ok_or_else(|| ApiError::NotFound(USER_ID_NOT_FOUND.to_string()))?;

    let token = generate_tokens(user.id, jwt)?;
    tracing::info!(user_id = %user.id, "token pair renewed");

    Ok(AuthPayload {
        user: UserResponse::from(user),
        token,
    })
}

/// ensure_admin
///
/// Creates the bootstrap account from `ADMIN_*` settings when neither its username nor
/// its email is taken yet. Returns whether an account was created.
pub async fn ensure_admin(repo: &dyn Repository, config: &AppConfig) -> ApiResult<bool> {
    let Some(admin) = &config.admin else {
        return Ok(false);
    };

    if repo.find_user_by_login(&admin.username).await?.is_some()
        || repo.find_user_by_login(&admin.email).await?.is_some()
    {
        tracing::debug!(username = %admin.username, "bootstrap account already present");
        return Ok(false);
    }

    let password_hash = hash_password(&admin.password)
        .map_err(|e| ApiError::Internal(format!("failed to hash bootstrap password: {e}")))?;

    let user = repo
        .create_user(NewUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password_hash,
            role_id: ADMIN_ROLE.to_string(),
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "bootstrap account created");
    Ok(true)
}
