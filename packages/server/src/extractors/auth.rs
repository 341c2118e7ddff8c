use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::entity::user;
use crate::error::AppError;
use crate::models::user::UserResponse;
use crate::state::AppState;
use crate::utils::cookies::ACCESS_COOKIE;
use crate::utils::jwt;

/// Authenticated user, resolved from the `accessToken` cookie or an
/// `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. The account is
/// re-read on every request, so deleted users lose access immediately.
#[derive(Debug)]
pub struct AuthUser {
    pub user: UserResponse,
}

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

/// Find the presented access token. `Ok(None)` means none was sent.
fn presented_token(parts: &Parts) -> Result<Option<String>, AppError> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ACCESS_COOKIE)
        && !cookie.value().is_empty()
    {
        return Ok(Some(cookie.value().to_string()));
    }

    let Some(auth_header) = parts.headers.get("Authorization") else {
        return Ok(None);
    };
    let token = auth_header
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or(AppError::TokenInvalid)?;
    Ok(Some(token.to_string()))
}

/// Token of an `Authorization` value. The scheme name is case-insensitive.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

async fn authenticate(token: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let claims = jwt::verify_access(token, &state.config.auth).map_err(|e| {
        tracing::debug!("Access token rejected: {e}");
        AppError::TokenInvalid
    })?;

    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    Ok(AuthUser {
        user: UserResponse::from(user),
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = presented_token(parts)?.ok_or(AppError::TokenMissing)?;
        authenticate(&token, state).await
    }
}

/// Like [`AuthUser`], but anonymous requests pass through as `None`.
///
/// A token that is present but invalid is still rejected.
#[derive(Debug)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl OptionalAuthUser {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(AuthUser::id)
    }
}

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match presented_token(parts)? {
            Some(token) => Ok(Self(Some(authenticate(&token, state).await?))),
            None => Ok(Self(None)),
        }
    }
}
