use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entity::{user, video};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::video::VideoListItem;

/// Look up a video by ID, returning 404 if not found.
pub async fn find_video<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<video::Model, AppError> {
    video::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".into()))
}

/// Look up a video the viewer may see. Unpublished videos exist only for their owner.
pub async fn find_visible_video<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    viewer: Option<Uuid>,
) -> Result<video::Model, AppError> {
    let video = find_video(db, id).await?;
    if !video.is_published && viewer != Some(video.owner_id) {
        return Err(AppError::NotFound("Video not found".into()));
    }
    Ok(video)
}

/// Check the caller owns the video, returning 403 otherwise.
pub fn require_video_owner(auth_user: &AuthUser, video: &video::Model) -> Result<(), AppError> {
    if video.owner_id != auth_user.id() {
        return Err(AppError::Forbidden(
            "You are not the owner of this video".into(),
        ));
    }
    Ok(())
}

/// Look up a user by ID, returning 404 with `not_found` as the message.
pub async fn find_user<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    not_found: &str,
) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(not_found.into()))
}

/// Load users by ID in one query.
pub async fn users_by_id<C: ConnectionTrait>(
    db: &C,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, user::Model>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

/// Load videos with their owners, keeping the order of `ids`.
///
/// Videos that no longer exist are skipped, as are unpublished videos not
/// owned by `viewer`.
pub async fn videos_in_order<C: ConnectionTrait>(
    db: &C,
    ids: &[Uuid],
    viewer: Uuid,
) -> Result<Vec<VideoListItem>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = video::Entity::find()
        .filter(video::Column::Id.is_in(ids.iter().copied()))
        .find_also_related(user::Entity)
        .all(db)
        .await?;

    let mut by_id: HashMap<Uuid, (video::Model, Option<user::Model>)> = rows
        .into_iter()
        .filter(|(v, _)| v.is_published || v.owner_id == viewer)
        .map(|(v, owner)| (v.id, (v, owner)))
        .collect();

    Ok(ids
        .iter()
        .filter_map(|id| by_id.remove(id))
        .map(|(v, owner)| VideoListItem::new(v, owner.as_ref()))
        .collect())
}
