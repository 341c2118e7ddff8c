use chrono::{DateTime, Utc};
use sea_orm::Order;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{user, video};
use crate::error::AppError;
use crate::models::shared::{OwnerSummary, parse_limit, parse_page, validate_title};

/// Query parameters for the public video listing.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct VideoListQuery {
    /// Page number (1-based, default 1).
    pub page: Option<String>,
    /// Items per page (default 10, max 100).
    pub limit: Option<String>,
    /// Full-text search over title and description.
    pub query: Option<String>,
    /// Sort field: `createdAt`, `views`, `duration` or `title`.
    pub sort_by: Option<String>,
    /// `asc` for ascending; any other value sorts descending.
    pub sort_type: Option<String>,
    /// Restrict to videos owned by this user.
    pub user_id: Option<String>,
}

impl VideoListQuery {
    pub fn page(&self) -> u64 {
        parse_page(self.page.as_deref())
    }

    pub fn limit(&self) -> u64 {
        parse_limit(self.limit.as_deref())
    }

    /// Non-blank search text, if any.
    pub fn search(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Resolve the requested ordering. Applies only when both `sortBy` and
    /// `sortType` are supplied; otherwise newest first.
    pub fn sort(&self) -> Result<(video::Column, Order), AppError> {
        match (self.sort_by.as_deref(), self.sort_type.as_deref()) {
            (Some(field), Some(direction)) => {
                let column = sort_column(field)?;
                let order = if direction.trim().eq_ignore_ascii_case("asc") {
                    Order::Asc
                } else {
                    Order::Desc
                };
                Ok((column, order))
            }
            _ => Ok((video::Column::CreatedAt, Order::Desc)),
        }
    }
}

fn sort_column(field: &str) -> Result<video::Column, AppError> {
    match field.trim() {
        "createdAt" | "created_at" => Ok(video::Column::CreatedAt),
        "views" => Ok(video::Column::Views),
        "duration" => Ok(video::Column::Duration),
        "title" => Ok(video::Column::Title),
        other => Err(AppError::Validation(format!(
            "Invalid sort_by field '{other}'. Valid: createdAt, views, duration, title"
        ))),
    }
}

/// A video as returned by create, update and publish-toggle.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: Uuid,
    #[schema(example = "Rust in ten minutes")]
    pub title: String,
    pub description: String,
    /// Length in seconds.
    #[schema(example = 612.4)]
    pub duration: f64,
    pub video_url: String,
    pub thumbnail_url: String,
    pub owner_id: Uuid,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<video::Model> for VideoResponse {
    fn from(video: video::Model) -> Self {
        Self {
            id: video.id,
            title: video.title,
            description: video.description,
            duration: video.duration,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            owner_id: video.owner_id,
            views: video.views,
            is_published: video.is_published,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

/// A video row in a list, with its owner's public identity joined in.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoListItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub video_url: String,
    pub thumbnail_url: String,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: Option<OwnerSummary>,
}

impl VideoListItem {
    pub fn new(video: video::Model, owner: Option<&user::Model>) -> Self {
        Self {
            id: video.id,
            title: video.title,
            description: video.description,
            duration: video.duration,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            views: video.views,
            is_published: video.is_published,
            created_at: video.created_at,
            updated_at: video.updated_at,
            owner: owner.map(OwnerSummary::from),
        }
    }
}

/// The channel behind a video, from the viewer's perspective.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: String,
    pub subscribers_count: u64,
    pub is_subscribed: bool,
}

/// Full video detail page.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetailResponse {
    #[serde(flatten)]
    pub video: VideoResponse,
    pub likes_count: u64,
    pub is_liked: bool,
    pub owner: ChannelSummary,
}

/// Validate title and description of a video.
pub fn validate_video_details(title: &str, description: &str) -> Result<(), AppError> {
    validate_title(title)?;
    if description.trim().chars().count() > 5000 {
        return Err(AppError::Validation(
            "Description must be at most 5000 characters".into(),
        ));
    }
    Ok(())
}
