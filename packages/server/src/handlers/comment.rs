use axum::extract::{Path, Query, State};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{comment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, OptionalAuthUser};
use crate::extractors::body::AppJson;
use crate::models::comment::*;
use crate::models::shared::{Page, PageQuery, parse_id};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::utils::lookup::find_visible_video;

async fn find_own_comment<C: ConnectionTrait>(
    db: &C,
    comment_id: Uuid,
    auth_user: &AuthUser,
) -> Result<comment::Model, AppError> {
    let comment = comment::Entity::find_by_id(comment_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;
    if comment.owner_id != auth_user.id() {
        return Err(AppError::Forbidden(
            "You are not the owner of this comment".into(),
        ));
    }
    Ok(comment)
}

#[utoipa::path(
    get,
    path = "/{videoId}",
    tag = "Comments",
    operation_id = "getVideoComments",
    summary = "List comments on a video",
    description = "Paginated, newest first. Comments on an unpublished video are visible only \
        to its owner.",
    params(
        ("videoId" = String, Path, description = "Video ID"),
        PageQuery,
    ),
    responses(
        (status = 200, description = "One page of comments", body = ApiResponse<Page<CommentResponse>>),
        (status = 400, description = "Invalid video id", body = ErrorBody),
        (status = 404, description = "Video not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state, viewer, page_query))]
pub async fn list_comments(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(page_query): Query<PageQuery>,
) -> Result<ApiResponse<Page<CommentResponse>>, AppError> {
    let video_id = parse_id(&video_id, "video id")?;
    let (page, limit) = page_query.resolve();
    find_visible_video(&state.db, video_id, viewer.id()).await?;

    let select = comment::Entity::find().filter(comment::Column::VideoId.eq(video_id));
    let total = select.clone().paginate(&state.db, limit).num_items().await?;
    if Page::<CommentResponse>::is_beyond(total, page, limit) {
        return Ok(ApiResponse::ok(
            Page::new(vec![], total, page, limit),
            "Comments fetched successfully",
        ));
    }

    let rows = select
        .find_also_related(user::Entity)
        .order_by_desc(comment::Column::CreatedAt)
        .order_by_desc(comment::Column::Id)
        .offset(Page::<CommentResponse>::offset(page, limit))
        .limit(limit)
        .all(&state.db)
        .await?;

    let docs = rows
        .into_iter()
        .map(|(c, owner)| CommentResponse::new(c, owner.as_ref()))
        .collect();

    Ok(ApiResponse::ok(
        Page::new(docs, total, page, limit),
        "Comments fetched successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/{videoId}",
    tag = "Comments",
    operation_id = "addComment",
    summary = "Comment on a video",
    params(("videoId" = String, Path, description = "Video ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = ApiResponse<CommentResponse>),
        (status = 400, description = "Invalid content or video id", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Video not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.id()))]
pub async fn add_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<ApiResponse<CommentResponse>, AppError> {
    let video_id = parse_id(&video_id, "video id")?;
    let content = validate_comment(&payload.content)?;
    find_visible_video(&state.db, video_id, Some(auth_user.id())).await?;

    let now = Utc::now();
    let created = comment::ActiveModel {
        id: Set(Uuid::now_v7()),
        content: Set(content),
        video_id: Set(video_id),
        owner_id: Set(auth_user.id()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    let owner = user::Entity::find_by_id(auth_user.id()).one(&state.db).await?;

    Ok(ApiResponse::created(
        CommentResponse::new(created, owner.as_ref()),
        "Comment added successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/c/{commentId}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Edit a comment",
    description = "Only the author may edit a comment.",
    params(("commentId" = String, Path, description = "Comment ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = ApiResponse<CommentResponse>),
        (status = 400, description = "Invalid content or comment id", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Not the author", body = ErrorBody),
        (status = 404, description = "Comment not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.id()))]
pub async fn update_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<ApiResponse<CommentResponse>, AppError> {
    let comment_id = parse_id(&comment_id, "comment id")?;
    let content = validate_comment(&payload.content)?;
    let comment = find_own_comment(&state.db, comment_id, &auth_user).await?;

    let mut active: comment::ActiveModel = comment.into();
    active.content = Set(content);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;

    let owner = user::Entity::find_by_id(updated.owner_id)
        .one(&state.db)
        .await?;

    Ok(ApiResponse::ok(
        CommentResponse::new(updated, owner.as_ref()),
        "Comment updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/c/{commentId}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
    description = "Only the author may delete a comment.",
    params(("commentId" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = ApiResponse<Empty>),
        (status = 400, description = "Invalid comment id", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Not the author", body = ErrorBody),
        (status = 404, description = "Comment not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<Empty>, AppError> {
    let comment_id = parse_id(&comment_id, "comment id")?;
    let comment = find_own_comment(&state.db, comment_id, &auth_user).await?;

    comment::Entity::delete_by_id(comment.id)
        .exec(&state.db)
        .await?;

    Ok(ApiResponse::ok(Empty {}, "Comment deleted successfully"))
}
