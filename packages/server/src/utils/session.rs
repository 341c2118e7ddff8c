use sea_orm::prelude::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use tracing::warn;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::entity::user;
use crate::error::AppError;
use crate::models::user::TokenPair;
use crate::utils::jwt;

fn sign_pair(user: &user::Model, config: &AuthConfig) -> Result<TokenPair, AppError> {
    let access_token = jwt::sign_access(user, config)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;
    let refresh_token = jwt::sign_refresh(user.id, config)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;
    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Issue a fresh token pair and make its refresh token the only one accepted
/// for the user. Any earlier session stops refreshing.
pub async fn issue<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    config: &AuthConfig,
) -> Result<TokenPair, AppError> {
    let user = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("User {user_id} missing while issuing tokens")))?;

    let tokens = sign_pair(&user, config)?;

    let mut active: user::ActiveModel = user.into();
    active.refresh_token = Set(Some(tokens.refresh_token.clone()));
    active.update(db).await?;

    Ok(tokens)
}

/// Exchange a refresh token for a new pair.
///
/// The token must verify and equal the stored one. The swap is conditional on
/// the stored value, so of two concurrent rotations of the same token only one
/// succeeds.
pub async fn rotate<C: ConnectionTrait>(
    db: &C,
    presented: &str,
    config: &AuthConfig,
) -> Result<TokenPair, AppError> {
    let claims = jwt::verify_refresh(presented, config).map_err(|e| {
        tracing::debug!("Refresh token rejected: {e}");
        AppError::TokenInvalid
    })?;

    let user = user::Entity::find_by_id(claims.sub)
        .one(db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    if user.refresh_token.as_deref() != Some(presented) {
        warn!(user_id = %user.id, "Superseded refresh token presented, possible reuse");
        return Err(AppError::TokenInvalid);
    }

    let tokens = sign_pair(&user, config)?;

    let swapped = user::Entity::update_many()
        .col_expr(
            user::Column::RefreshToken,
            Expr::value(tokens.refresh_token.clone()),
        )
        .filter(user::Column::Id.eq(user.id))
        .filter(user::Column::RefreshToken.eq(presented))
        .exec(db)
        .await?;

    if swapped.rows_affected == 0 {
        warn!(user_id = %user.id, "Refresh token rotated concurrently");
        return Err(AppError::TokenInvalid);
    }

    Ok(tokens)
}

/// Forget the user's refresh token so no session can be refreshed.
pub async fn revoke<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<(), AppError> {
    user::Entity::update_many()
        .col_expr(user::Column::RefreshToken, Expr::value(Option::<String>::None))
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}
