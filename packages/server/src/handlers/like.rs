use axum::extract::{Path, State};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::instrument;

use crate::entity::video_like;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::like::LikeStatus;
use crate::models::shared::parse_id;
use crate::models::video::VideoListItem;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::utils::lookup::{find_visible_video, videos_in_order};

#[utoipa::path(
    post,
    path = "/toggle/v/{videoId}",
    tag = "Likes",
    operation_id = "toggleVideoLike",
    summary = "Like or unlike a video",
    description = "Removes the caller's like if present, otherwise adds one.",
    params(("videoId" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Like toggled", body = ApiResponse<LikeStatus>),
        (status = 400, description = "Invalid video id", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Video not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn toggle_video_like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<LikeStatus>, AppError> {
    let video_id = parse_id(&video_id, "video id")?;
    find_visible_video(&state.db, video_id, Some(auth_user.id())).await?;

    let removed = video_like::Entity::delete_by_id((video_id, auth_user.id()))
        .exec(&state.db)
        .await?;
    if removed.rows_affected > 0 {
        return Ok(ApiResponse::ok(
            LikeStatus { is_liked: false },
            "Video unliked successfully",
        ));
    }

    let like = video_like::ActiveModel {
        video_id: Set(video_id),
        liked_by: Set(auth_user.id()),
        created_at: Set(Utc::now()),
    };
    match video_like::Entity::insert(like)
        .on_conflict(
            OnConflict::columns([video_like::Column::VideoId, video_like::Column::LikedBy])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await
    {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(ApiResponse::ok(
        LikeStatus { is_liked: true },
        "Video liked successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/videos",
    tag = "Likes",
    operation_id = "getLikedVideos",
    summary = "List liked videos",
    description = "Videos the caller has liked, most recent like first. Unpublished videos of \
        other users are left out.",
    responses(
        (status = 200, description = "Liked videos", body = ApiResponse<Vec<VideoListItem>>),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn liked_videos(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<VideoListItem>>, AppError> {
    let video_ids: Vec<uuid::Uuid> = video_like::Entity::find()
        .filter(video_like::Column::LikedBy.eq(auth_user.id()))
        .order_by_desc(video_like::Column::CreatedAt)
        .order_by_desc(video_like::Column::VideoId)
        .select_only()
        .column(video_like::Column::VideoId)
        .into_tuple()
        .all(&state.db)
        .await?;

    let items = videos_in_order(&state.db, &video_ids, auth_user.id()).await?;

    Ok(ApiResponse::ok(items, "Liked videos fetched successfully"))
}
