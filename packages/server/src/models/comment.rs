use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{comment, user};
use crate::error::AppError;
use crate::models::shared::OwnerSummary;

/// Request body for adding or editing a comment.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CommentRequest {
    #[serde(default)]
    #[schema(example = "Great explanation, thanks!")]
    pub content: String,
}

/// Validate and trim comment text (1-1000 characters).
pub fn validate_comment(content: &str) -> Result<String, AppError> {
    let content = content.trim();
    if content.is_empty() || content.chars().count() > 1000 {
        return Err(AppError::Validation(
            "Comment must be 1-1000 characters".into(),
        ));
    }
    Ok(content.to_string())
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub content: String,
    pub video_id: Uuid,
    pub owner: Option<OwnerSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentResponse {
    pub fn new(comment: comment::Model, owner: Option<&user::Model>) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            video_id: comment.video_id,
            owner: owner.map(OwnerSummary::from),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}
