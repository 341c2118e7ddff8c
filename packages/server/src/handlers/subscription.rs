use axum::extract::{Path, State};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::instrument;

use crate::entity::subscription;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::shared::parse_id;
use crate::models::subscription::*;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::utils::lookup::{find_user, users_by_id};

#[utoipa::path(
    post,
    path = "/c/{channelId}",
    tag = "Subscriptions",
    operation_id = "toggleSubscription",
    summary = "Subscribe to or unsubscribe from a channel",
    params(("channelId" = String, Path, description = "Channel (user) ID")),
    responses(
        (status = 200, description = "Subscription toggled", body = ApiResponse<SubscriptionStatus>),
        (status = 400, description = "Invalid channel id or own channel", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Channel not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn toggle_subscription(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<SubscriptionStatus>, AppError> {
    let channel_id = parse_id(&channel_id, "channel id")?;
    if channel_id == auth_user.id() {
        return Err(AppError::Validation(
            "You cannot subscribe to your own channel".into(),
        ));
    }
    find_user(&state.db, channel_id, "Channel not found").await?;

    let removed = subscription::Entity::delete_by_id((auth_user.id(), channel_id))
        .exec(&state.db)
        .await?;
    if removed.rows_affected > 0 {
        return Ok(ApiResponse::ok(
            SubscriptionStatus {
                is_subscribed: false,
            },
            "Unsubscribed successfully",
        ));
    }

    let row = subscription::ActiveModel {
        subscriber_id: Set(auth_user.id()),
        channel_id: Set(channel_id),
        created_at: Set(Utc::now()),
    };
    match subscription::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([
                subscription::Column::SubscriberId,
                subscription::Column::ChannelId,
            ])
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
        SubscriptionStatus {
            is_subscribed: true,
        },
        "Subscribed successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/c/{channelId}/subscribers",
    tag = "Subscriptions",
    operation_id = "getChannelSubscribers",
    summary = "List a channel's subscribers",
    description = "Most recent subscription first.",
    params(("channelId" = String, Path, description = "Channel (user) ID")),
    responses(
        (status = 200, description = "Subscribers", body = ApiResponse<Vec<SubscriptionEntry>>),
        (status = 400, description = "Invalid channel id", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Channel not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn channel_subscribers(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<Vec<SubscriptionEntry>>, AppError> {
    let channel_id = parse_id(&channel_id, "channel id")?;
    find_user(&state.db, channel_id, "Channel not found").await?;

    let rows = subscription::Entity::find()
        .filter(subscription::Column::ChannelId.eq(channel_id))
        .order_by_desc(subscription::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let ids: Vec<_> = rows.iter().map(|s| s.subscriber_id).collect();
    let users = users_by_id(&state.db, &ids).await?;
    let entries = rows
        .iter()
        .filter_map(|s| {
            users
                .get(&s.subscriber_id)
                .map(|u| SubscriptionEntry::new(u, s.created_at))
        })
        .collect();

    Ok(ApiResponse::ok(entries, "Subscribers fetched successfully"))
}

#[utoipa::path(
    get,
    path = "/u/{subscriberId}/channels",
    tag = "Subscriptions",
    operation_id = "getSubscribedChannels",
    summary = "List channels a user follows",
    description = "Most recent subscription first.",
    params(("subscriberId" = String, Path, description = "Subscriber (user) ID")),
    responses(
        (status = 200, description = "Subscribed channels", body = ApiResponse<Vec<SubscriptionEntry>>),
        (status = 400, description = "Invalid subscriber id", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn subscribed_channels(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(subscriber_id): Path<String>,
) -> Result<ApiResponse<Vec<SubscriptionEntry>>, AppError> {
    let subscriber_id = parse_id(&subscriber_id, "subscriber id")?;
    find_user(&state.db, subscriber_id, "User not found").await?;

    let rows = subscription::Entity::find()
        .filter(subscription::Column::SubscriberId.eq(subscriber_id))
        .order_by_desc(subscription::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let ids: Vec<_> = rows.iter().map(|s| s.channel_id).collect();
    let users = users_by_id(&state.db, &ids).await?;
    let entries = rows
        .iter()
        .filter_map(|s| {
            users
                .get(&s.channel_id)
                .map(|u| SubscriptionEntry::new(u, s.created_at))
        })
        .collect();

    Ok(ApiResponse::ok(
        entries,
        "Subscribed channels fetched successfully",
    ))
}
