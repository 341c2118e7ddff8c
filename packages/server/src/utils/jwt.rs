use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::entity::user;

/// Claims carried by the short-lived access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid, // User ID
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by the refresh token.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    /// Unique per issued token so rotations within one second still differ.
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

fn window(ttl_secs: i64) -> (i64, i64) {
    let now = Utc::now();
    let exp = now + Duration::seconds(ttl_secs);
    (now.timestamp(), exp.timestamp())
}

/// Sign an access token for a user.
pub fn sign_access(user: &user::Model, config: &AuthConfig) -> Result<String> {
    let (iat, exp) = window(config.access_token_ttl);
    let claims = AccessClaims {
        sub: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        iat,
        exp,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.access_token_secret.as_bytes()),
    )?;
    Ok(token)
}

/// Verify and decode an access token.
pub fn verify_access(token: &str, config: &AuthConfig) -> Result<AccessClaims> {
    let token_data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(config.access_token_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Sign a refresh token for a user.
pub fn sign_refresh(user_id: Uuid, config: &AuthConfig) -> Result<String> {
    let (iat, exp) = window(config.refresh_token_ttl);
    let claims = RefreshClaims {
        sub: user_id,
        jti: Uuid::new_v4(),
        iat,
        exp,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
    )?;
    Ok(token)
}

/// Verify and decode a refresh token.
pub fn verify_refresh(token: &str, config: &AuthConfig) -> Result<RefreshClaims> {
    let token_data = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
