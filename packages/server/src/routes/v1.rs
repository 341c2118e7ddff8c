use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{comment, like, subscription, user, video};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/users", user_routes(config))
        .nest("/videos", video_routes(config))
        .nest("/likes", like_routes())
        .nest("/comments", comment_routes())
        .nest("/subscriptions", subscription_routes())
}

fn user_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let json = OpenApiRouter::new()
        .routes(routes!(user::login))
        .routes(routes!(user::logout))
        .routes(routes!(user::refresh_token))
        .routes(routes!(user::change_password))
        .routes(routes!(user::current_user))
        .routes(routes!(user::update_account))
        .routes(routes!(user::channel_profile))
        .routes(routes!(user::watch_history));

    let upload = OpenApiRouter::new()
        .routes(routes!(user::register))
        .routes(routes!(user::change_avatar))
        .routes(routes!(user::change_cover_image))
        .layer(user::image_upload_body_limit(config.storage.max_upload_size));

    json.merge(upload)
}

fn video_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let plain = OpenApiRouter::new()
        .routes(routes!(video::list_videos))
        .routes(routes!(video::get_video, video::delete_video))
        .routes(routes!(video::toggle_publish));

    let upload = OpenApiRouter::new()
        .routes(routes!(video::publish_video))
        .routes(routes!(video::update_video))
        .layer(video::video_upload_body_limit(config.storage.max_upload_size));

    plain.merge(upload)
}

fn like_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(like::toggle_video_like))
        .routes(routes!(like::liked_videos))
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(comment::list_comments, comment::add_comment))
        .routes(routes!(comment::update_comment, comment::delete_comment))
}

fn subscription_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(subscription::toggle_subscription))
        .routes(routes!(subscription::channel_subscribers))
        .routes(routes!(subscription::subscribed_channels))
}
