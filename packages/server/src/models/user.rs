use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::user;
use crate::error::AppError;
use crate::models::shared::required;

/// Public view of an account. Never carries the password hash or refresh token.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "Alice Liddell")]
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            cover_image_url: user.cover_image_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Text fields of a registration form, validated and normalized.
#[derive(Debug)]
pub struct NewUser {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    pub fn parse(
        full_name: Option<&str>,
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, AppError> {
        let (Some(full_name), Some(username), Some(email), Some(password)) = (
            required(full_name),
            required(username),
            required(email),
            password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::Validation("All fields are required".into()));
        };

        let username = normalize(&username);
        let email = normalize(&email);
        validate_full_name(&full_name)?;
        validate_username(&username)?;
        validate_email(&email)?;
        validate_password(password)?;

        Ok(Self {
            full_name,
            username,
            email,
            password: password.to_string(),
        })
    }
}

/// Lower-case and trim an identifier the way it is stored.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err(AppError::Validation(
            "Username must be 3-32 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.')
    {
        return Err(AppError::Validation(
            "Username must contain only letters, digits, underscores and dots".into(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::Validation("Email is invalid".into());
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_full_name(full_name: &str) -> Result<(), AppError> {
    let len = full_name.trim().chars().count();
    if len == 0 || len > 64 {
        return Err(AppError::Validation(
            "Full name must be 1-64 characters".into(),
        ));
    }
    Ok(())
}

/// Request body for login. Either `username` or `email` identifies the account.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice")]
    pub username: Option<String>,
    #[schema(example = "alice@example.com")]
    pub email: Option<String>,
    #[serde(default)]
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

/// Access and refresh token issued together.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Optional body for token refresh when the cookie is unavailable.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[schema(example = "Alice Liddell")]
    pub full_name: Option<String>,
    #[schema(example = "alice@example.com")]
    pub email: Option<String>,
}

/// A user's channel page as seen by the requester.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub subscribers_count: u64,
    pub channels_subscribed_to_count: u64,
    /// Whether the requester follows this channel.
    pub is_subscribed: bool,
}
