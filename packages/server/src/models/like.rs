use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    /// Whether the requester likes the video after the toggle.
    pub is_liked: bool,
}
