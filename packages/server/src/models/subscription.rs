use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::user;

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    /// Whether the requester follows the channel after the toggle.
    pub is_subscribed: bool,
}

/// One side of a subscription: a subscriber of a channel, or a channel a user follows.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEntry {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub subscribed_at: DateTime<Utc>,
}

impl SubscriptionEntry {
    pub fn new(user: &user::Model, subscribed_at: DateTime<Utc>) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            avatar_url: user.avatar_url.clone(),
            subscribed_at,
        }
    }
}
