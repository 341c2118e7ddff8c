use axum::extract::{DefaultBodyLimit, Path, Query, State};
use chrono::Utc;
use common::MediaKind;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::database::VIDEO_SEARCH_VECTOR;
use crate::entity::{comment, subscription, user, video, video_like, watch_history};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::body::AppMultipart;
use crate::extractors::form::MultipartForm;
use crate::handlers::user::record_view;
use crate::models::shared::{Page, parse_id, required};
use crate::models::video::*;
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::utils::lookup::{find_video, find_visible_video, require_video_owner};

/// Body limit for routes that accept a video and a thumbnail.
pub fn video_upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = max_upload_size.saturating_mul(2).saturating_add(1024 * 1024);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

/// Read the required `title` and `description` fields of a video form.
fn video_details(form: &MultipartForm) -> Result<(String, String), AppError> {
    let (Some(title), Some(description)) =
        (required(form.text("title")), required(form.text("description")))
    else {
        return Err(AppError::Validation(
            "Title and description are required".into(),
        ));
    };
    validate_video_details(&title, &description)?;
    Ok((title, description))
}

#[utoipa::path(
    get,
    path = "/get-allVideos",
    tag = "Videos",
    operation_id = "listVideos",
    summary = "List published videos",
    description = "Paginated listing of published videos with the owner's identity joined in. \
        `query` runs a full-text search over title and description, `userId` restricts to one \
        owner. Sorting applies only when both `sortBy` and `sortType` are given; otherwise \
        newest first.",
    params(VideoListQuery),
    responses(
        (status = 200, description = "One page of videos", body = ApiResponse<Page<VideoListItem>>),
        (status = 400, description = "Invalid userId or sortBy", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideoListQuery>,
) -> Result<ApiResponse<Page<VideoListItem>>, AppError> {
    let page = query.page();
    let limit = query.limit();
    let (sort_column, sort_order) = query.sort()?;

    let mut select = video::Entity::find();

    if let Some(search) = query.search() {
        select = select.filter(Expr::cust_with_values(
            format!("{VIDEO_SEARCH_VECTOR} @@ plainto_tsquery('simple', ?)"),
            [search.to_string()],
        ));
    }

    if let Some(user_id) = query
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    {
        let owner_id = parse_id(user_id, "user")?;
        select = select.filter(video::Column::OwnerId.eq(owner_id));
    }

    select = select.filter(video::Column::IsPublished.eq(true));

    let total = select.clone().paginate(&state.db, limit).num_items().await?;
    if Page::<VideoListItem>::is_beyond(total, page, limit) {
        return Ok(ApiResponse::ok(
            Page::new(vec![], total, page, limit),
            "Videos fetched successfully",
        ));
    }

    let rows = select
        .find_also_related(user::Entity)
        .order_by(sort_column, sort_order)
        .order_by(video::Column::Id, Order::Desc)
        .offset(Page::<VideoListItem>::offset(page, limit))
        .limit(limit)
        .all(&state.db)
        .await?;

    let docs = rows
        .into_iter()
        .map(|(v, owner)| VideoListItem::new(v, owner.as_ref()))
        .collect();

    Ok(ApiResponse::ok(
        Page::new(docs, total, page, limit),
        "Videos fetched successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/publish-video",
    tag = "Videos",
    operation_id = "publishVideo",
    summary = "Upload and publish a video",
    description = "Multipart form with `title`, `description`, one `videoFile` and one \
        `thumbnail`. The duration is read from the uploaded file when possible.",
    request_body(content_type = "multipart/form-data", description = "Video upload form"),
    responses(
        (status = 201, description = "Video published", body = ApiResponse<VideoResponse>),
        (status = 400, description = "Missing field or file", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 500, description = "Media upload failed", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.id()))]
pub async fn publish_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> Result<ApiResponse<VideoResponse>, AppError> {
    let mut form =
        MultipartForm::collect(multipart, &["videoFile", "thumbnail"], &state.config.storage)
            .await?;
    let (title, description) = video_details(&form)?;

    let video_file = form
        .take_file("videoFile")
        .ok_or_else(|| AppError::Validation("Video file is required".into()))?;
    let thumbnail_file = form
        .take_file("thumbnail")
        .ok_or_else(|| AppError::Validation("Thumbnail is required".into()))?;

    let video_asset = state.media.upload(video_file, MediaKind::Video).await?;
    let thumbnail = match state.media.upload(thumbnail_file, MediaKind::Image).await {
        Ok(asset) => asset,
        Err(e) => {
            state.media.discard(&video_asset).await;
            return Err(e);
        }
    };

    let now = Utc::now();
    let model = video::ActiveModel {
        id: Set(Uuid::now_v7()),
        title: Set(title),
        description: Set(description),
        duration: Set(video_asset.duration.unwrap_or(0.0)),
        video_url: Set(video_asset.url.clone()),
        video_file_id: Set(video_asset.storage_id.clone()),
        thumbnail_url: Set(thumbnail.url.clone()),
        thumbnail_id: Set(thumbnail.storage_id.clone()),
        owner_id: Set(auth_user.id()),
        views: Set(0),
        is_published: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = match model.insert(&state.db).await {
        Ok(created) => created,
        Err(e) => {
            state.media.discard(&video_asset).await;
            state.media.discard(&thumbnail).await;
            return Err(e.into());
        }
    };

    tracing::info!(video_id = %created.id, "Video published");

    Ok(ApiResponse::created(
        VideoResponse::from(created),
        "Video published successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/v/{videoId}",
    tag = "Videos",
    operation_id = "getVideo",
    summary = "Watch a video",
    description = "Returns the video with like and channel statistics. Each call counts a view \
        and adds the video to the caller's watch history (once). Unpublished videos are visible \
        only to their owner.",
    params(("videoId" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video detail", body = ApiResponse<VideoDetailResponse>),
        (status = 400, description = "Invalid video id", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Video not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn get_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<VideoDetailResponse>, AppError> {
    let video_id = parse_id(&video_id, "video id")?;
    let viewer = auth_user.id();

    find_visible_video(&state.db, video_id, Some(viewer)).await?;

    video::Entity::update_many()
        .col_expr(
            video::Column::Views,
            Expr::col(video::Column::Views).add(1),
        )
        .filter(video::Column::Id.eq(video_id))
        .exec(&state.db)
        .await?;
    record_view(&state.db, viewer, video_id).await?;

    let (video, owner) = video::Entity::find_by_id(video_id)
        .find_also_related(user::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".into()))?;
    let owner =
        owner.ok_or_else(|| AppError::Internal(format!("Video {video_id} has no owner row")))?;

    let (likes_count, liked, subscribers_count, subscribed) = tokio::try_join!(
        video_like::Entity::find()
            .filter(video_like::Column::VideoId.eq(video_id))
            .count(&state.db),
        video_like::Entity::find_by_id((video_id, viewer)).one(&state.db),
        subscription::Entity::find()
            .filter(subscription::Column::ChannelId.eq(owner.id))
            .count(&state.db),
        subscription::Entity::find_by_id((viewer, owner.id)).one(&state.db),
    )?;

    Ok(ApiResponse::ok(
        VideoDetailResponse {
            video: VideoResponse::from(video),
            likes_count,
            is_liked: liked.is_some(),
            owner: ChannelSummary {
                id: owner.id,
                username: owner.username,
                avatar_url: owner.avatar_url,
                subscribers_count,
                is_subscribed: subscribed.is_some(),
            },
        },
        "Video fetched successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/v/{videoId}",
    tag = "Videos",
    operation_id = "updateVideo",
    summary = "Update a video's details",
    description = "Multipart form with `title`, `description` and a replacement `thumbnail`. \
        Owner only. The previous thumbnail is deleted from storage.",
    params(("videoId" = String, Path, description = "Video ID")),
    request_body(content_type = "multipart/form-data", description = "Video details form"),
    responses(
        (status = 200, description = "Video updated", body = ApiResponse<VideoResponse>),
        (status = 400, description = "Missing field or invalid id", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Video not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.id()))]
pub async fn update_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    AppMultipart(multipart): AppMultipart,
) -> Result<ApiResponse<VideoResponse>, AppError> {
    let video_id = parse_id(&video_id, "video id")?;
    let video = find_video(&state.db, video_id).await?;
    require_video_owner(&auth_user, &video)?;

    let mut form = MultipartForm::collect(multipart, &["thumbnail"], &state.config.storage).await?;
    let (title, description) = video_details(&form)?;

    let thumbnail_file = form
        .take_file("thumbnail")
        .ok_or_else(|| AppError::Validation("Thumbnail is required".into()))?;
    let thumbnail = state.media.upload(thumbnail_file, MediaKind::Image).await?;
    let previous_thumbnail = video.thumbnail_id.clone();

    let mut active: video::ActiveModel = video.into();
    active.title = Set(title);
    active.description = Set(description);
    active.thumbnail_url = Set(thumbnail.url.clone());
    active.thumbnail_id = Set(thumbnail.storage_id.clone());
    active.updated_at = Set(Utc::now());

    let updated = match active.update(&state.db).await {
        Ok(updated) => updated,
        Err(e) => {
            state.media.discard(&thumbnail).await;
            return Err(e.into());
        }
    };

    state
        .media
        .delete(&previous_thumbnail, MediaKind::Image)
        .await;

    Ok(ApiResponse::ok(
        VideoResponse::from(updated),
        "Video updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/v/{videoId}",
    tag = "Videos",
    operation_id = "deleteVideo",
    summary = "Delete a video",
    description = "Owner only. Removes the video with its likes, comments and watch-history \
        entries, then deletes the stored video file and thumbnail.",
    params(("videoId" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video deleted", body = ApiResponse<Empty>),
        (status = 400, description = "Invalid video id", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Video not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn delete_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Empty>, AppError> {
    let video_id = parse_id(&video_id, "video id")?;
    let video = find_video(&state.db, video_id).await?;
    require_video_owner(&auth_user, &video)?;

    let txn = state.db.begin().await?;
    video_like::Entity::delete_many()
        .filter(video_like::Column::VideoId.eq(video_id))
        .exec(&txn)
        .await?;
    comment::Entity::delete_many()
        .filter(comment::Column::VideoId.eq(video_id))
        .exec(&txn)
        .await?;
    watch_history::Entity::delete_many()
        .filter(watch_history::Column::VideoId.eq(video_id))
        .exec(&txn)
        .await?;
    video::Entity::delete_by_id(video_id).exec(&txn).await?;
    txn.commit().await?;

    state
        .media
        .delete(&video.thumbnail_id, MediaKind::Image)
        .await;
    state
        .media
        .delete(&video.video_file_id, MediaKind::Video)
        .await;

    tracing::info!(%video_id, "Video deleted");

    Ok(ApiResponse::ok(Empty {}, "Video deleted successfully"))
}

#[utoipa::path(
    patch,
    path = "/toggle/publish/{videoId}",
    tag = "Videos",
    operation_id = "togglePublishStatus",
    summary = "Publish or unpublish a video",
    description = "Owner only. Flips `isPublished`.",
    params(("videoId" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Publish status toggled", body = ApiResponse<VideoResponse>),
        (status = 400, description = "Invalid video id", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Video not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn toggle_publish(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<VideoResponse>, AppError> {
    let video_id = parse_id(&video_id, "video id")?;
    let video = find_video(&state.db, video_id).await?;
    require_video_owner(&auth_user, &video)?;

    let is_published = !video.is_published;
    let mut active: video::ActiveModel = video.into();
    active.is_published = Set(is_published);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;

    Ok(ApiResponse::ok(
        VideoResponse::from(updated),
        "Video publish status toggled successfully",
    ))
}
