use axum::extract::{DefaultBodyLimit, Path, State};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use common::MediaKind;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{subscription, user, watch_history};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::body::{AppJson, AppMultipart, OptionalJson};
use crate::extractors::form::MultipartForm;
use crate::models::shared::required;
use crate::models::user::*;
use crate::models::video::VideoListItem;
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::utils::cookies::{self, REFRESH_COOKIE};
use crate::utils::lookup::videos_in_order;
use crate::utils::{hash, session};

/// Body limit for routes that accept an image upload.
pub fn image_upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    // Two images plus form overhead.
    DefaultBodyLimit::max(usize::try_from(max_upload_size.saturating_mul(2)).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Users",
    operation_id = "registerUser",
    summary = "Register a new account",
    description = "Multipart form with `fullName`, `username`, `email`, `password`, a required \
        `avatar` image and an optional `coverImage`. Username and email are stored lower-cased. \
        Conflicts are detected before any image is uploaded.",
    request_body(content_type = "multipart/form-data", description = "Registration form"),
    responses(
        (status = 201, description = "User registered", body = ApiResponse<UserResponse>),
        (status = 400, description = "Missing or invalid field", body = ErrorBody),
        (status = 409, description = "Username or email already exists", body = ErrorBody),
        (status = 500, description = "Media upload failed", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn register(
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let mut form =
        MultipartForm::collect(multipart, &["avatar", "coverImage"], &state.config.storage).await?;

    let new_user = NewUser::parse(
        form.text("fullName"),
        form.text("username"),
        form.text("email"),
        form.text("password"),
    )?;

    let existing = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(new_user.username.as_str()))
                .add(user::Column::Email.eq(new_user.email.as_str())),
        )
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "User with email or username already exists".into(),
        ));
    }

    let avatar_file = form
        .take_file("avatar")
        .ok_or_else(|| AppError::Validation("Avatar file is required".into()))?;
    let cover_file = form.take_file("coverImage");

    let password_hash = hash::hash_password(&new_user.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let avatar = state.media.upload(avatar_file, MediaKind::Image).await?;
    let cover = match cover_file {
        Some(file) => match state.media.upload(file, MediaKind::Image).await {
            Ok(asset) => Some(asset),
            Err(e) => {
                state.media.discard(&avatar).await;
                return Err(e);
            }
        },
        None => None,
    };

    let now = Utc::now();
    let model = user::ActiveModel {
        id: Set(uuid::Uuid::now_v7()),
        username: Set(new_user.username),
        email: Set(new_user.email),
        full_name: Set(new_user.full_name),
        password: Set(password_hash),
        avatar_url: Set(avatar.url.clone()),
        avatar_id: Set(avatar.storage_id.clone()),
        cover_image_url: Set(cover.as_ref().map(|c| c.url.clone())),
        cover_image_id: Set(cover.as_ref().map(|c| c.storage_id.clone())),
        refresh_token: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = match model.insert(&state.db).await {
        Ok(created) => created,
        Err(e) => {
            state.media.discard(&avatar).await;
            if let Some(cover) = &cover {
                state.media.discard(cover).await;
            }
            return Err(match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    tracing::debug!("Registration race condition: unique constraint caught on insert");
                    AppError::Conflict("User with email or username already exists".into())
                }
                _ => AppError::from(e),
            });
        }
    };

    Ok(ApiResponse::created(
        UserResponse::from(created),
        "User registered successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Users",
    operation_id = "loginUser",
    summary = "Log in with username or email",
    description = "Returns the user and a token pair, and sets `accessToken` and `refreshToken` \
        HttpOnly cookies. Logging in invalidates any earlier refresh token.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Username or email missing", body = ErrorBody),
        (status = 401, description = "Password is incorrect", body = ErrorBody),
        (status = 404, description = "User does not exist", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>), AppError> {
    let username = payload.username.as_deref().map(normalize).filter(|u| !u.is_empty());
    let email = payload.email.as_deref().map(normalize).filter(|e| !e.is_empty());

    if username.is_none() && email.is_none() {
        return Err(AppError::Validation("Username or email is required".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password is required".into()));
    }

    let user = user::Entity::find()
        .filter(
            Condition::any()
                .add_option(username.map(|u| user::Column::Username.eq(u)))
                .add_option(email.map(|e| user::Column::Email.eq(e))),
        )
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".into()))?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials("Password is incorrect".into()));
    }

    let tokens = session::issue(&state.db, user.id, &state.config.auth).await?;
    let jar = cookies::with_session(jar, &tokens, &state.config.auth);

    Ok((
        jar,
        ApiResponse::ok(
            LoginResponse {
                user: UserResponse::from(user),
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Users",
    operation_id = "logoutUser",
    summary = "Log out",
    description = "Forgets the stored refresh token and clears both session cookies.",
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<Empty>),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, jar), fields(user_id = %auth_user.id()))]
pub async fn logout(
    auth_user: AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<Empty>), AppError> {
    session::revoke(&state.db, auth_user.id()).await?;
    Ok((
        cookies::without_session(jar),
        ApiResponse::ok(Empty {}, "User logged out"),
    ))
}

#[utoipa::path(
    post,
    path = "/refresh-token",
    tag = "Users",
    operation_id = "refreshAccessToken",
    summary = "Rotate the session tokens",
    description = "Takes the refresh token from the `refreshToken` cookie or the JSON body. \
        The token must be the most recently issued one; the old token stops working.",
    request_body(content = RefreshTokenRequest, description = "Used when the cookie is absent"),
    responses(
        (status = 200, description = "Tokens rotated", body = ApiResponse<TokenPair>),
        (status = 401, description = "Missing, invalid, expired or superseded token", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, body))]
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    OptionalJson(body): OptionalJson<RefreshTokenRequest>,
) -> Result<(CookieJar, ApiResponse<TokenPair>), AppError> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .or(body.refresh_token.filter(|t| !t.is_empty()))
        .ok_or(AppError::TokenMissing)?;

    let tokens = session::rotate(&state.db, &presented, &state.config.auth).await?;
    let jar = cookies::with_session(jar, &tokens, &state.config.auth);

    Ok((jar, ApiResponse::ok(tokens, "Access token refreshed")))
}

#[utoipa::path(
    method(post, patch),
    path = "/change-password",
    tag = "Users",
    operation_id = "changePassword",
    summary = "Change the current user's password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<Empty>),
        (status = 400, description = "Invalid old password or weak new password", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.id()))]
pub async fn change_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<ApiResponse<Empty>, AppError> {
    let user = user::Entity::find_by_id(auth_user.id())
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    let is_valid = hash::verify_password(&payload.old_password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::Validation("Invalid old password".into()));
    }
    validate_password(&payload.new_password)?;

    let password_hash = hash::hash_password(&payload.new_password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let mut active: user::ActiveModel = user.into();
    active.password = Set(password_hash);
    active.updated_at = Set(Utc::now());
    active.update(&state.db).await?;

    Ok(ApiResponse::ok(Empty {}, "Password changed successfully"))
}

#[utoipa::path(
    get,
    path = "/current-user",
    tag = "Users",
    operation_id = "getCurrentUser",
    summary = "Get the authenticated user",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user), fields(user_id = %auth_user.id()))]
pub async fn current_user(auth_user: AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(auth_user.user, "Current user fetched successfully")
}

#[utoipa::path(
    patch,
    path = "/update-account",
    tag = "Users",
    operation_id = "updateAccount",
    summary = "Update full name and email",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Missing or invalid field", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 409, description = "Email already in use", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.id()))]
pub async fn update_account(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateAccountRequest>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let (Some(full_name), Some(email)) = (
        required(payload.full_name.as_deref()),
        required(payload.email.as_deref()),
    ) else {
        return Err(AppError::Validation("All fields are required".into()));
    };
    let email = normalize(&email);
    validate_full_name(&full_name)?;
    validate_email(&email)?;

    let user = user::Entity::find_by_id(auth_user.id())
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    let mut active: user::ActiveModel = user.into();
    active.full_name = Set(full_name);
    active.email = Set(email);
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Email is already in use".into())
        }
        _ => AppError::from(e),
    })?;

    Ok(ApiResponse::ok(
        UserResponse::from(updated),
        "Account details updated successfully",
    ))
}

/// Which profile image a replacement targets.
#[derive(Clone, Copy, Debug)]
enum ProfileImage {
    Avatar,
    Cover,
}

impl ProfileImage {
    fn field(self) -> &'static str {
        match self {
            Self::Avatar => "avatar",
            Self::Cover => "coverImage",
        }
    }
}

/// Upload a new profile image, store its reference, then drop the old object.
async fn replace_profile_image(
    state: &AppState,
    auth_user: &AuthUser,
    mut form: MultipartForm,
    which: ProfileImage,
) -> Result<user::Model, AppError> {
    let field = which.field();
    let file = form
        .take_file(field)
        .ok_or_else(|| AppError::Validation(format!("{field} file is missing")))?;

    let user = user::Entity::find_by_id(auth_user.id())
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    let previous = match which {
        ProfileImage::Avatar => Some(user.avatar_id.clone()),
        ProfileImage::Cover => user.cover_image_id.clone(),
    };

    let asset = state.media.upload(file, MediaKind::Image).await?;

    let mut active: user::ActiveModel = user.into();
    match which {
        ProfileImage::Avatar => {
            active.avatar_url = Set(asset.url.clone());
            active.avatar_id = Set(asset.storage_id.clone());
        }
        ProfileImage::Cover => {
            active.cover_image_url = Set(Some(asset.url.clone()));
            active.cover_image_id = Set(Some(asset.storage_id.clone()));
        }
    }
    active.updated_at = Set(Utc::now());

    let updated = match active.update(&state.db).await {
        Ok(updated) => updated,
        Err(e) => {
            state.media.discard(&asset).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = previous.filter(|id| !id.is_empty()) {
        state.media.delete(&previous, MediaKind::Image).await;
    }

    Ok(updated)
}

#[utoipa::path(
    patch,
    path = "/change-avatar",
    tag = "Users",
    operation_id = "changeAvatar",
    summary = "Replace the avatar image",
    request_body(content_type = "multipart/form-data", description = "`avatar` image file"),
    responses(
        (status = 200, description = "Avatar updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Avatar file is missing", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 500, description = "Media upload failed", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.id()))]
pub async fn change_avatar(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let form = MultipartForm::collect(multipart, &["avatar"], &state.config.storage).await?;
    let updated = replace_profile_image(&state, &auth_user, form, ProfileImage::Avatar).await?;
    Ok(ApiResponse::ok(
        UserResponse::from(updated),
        "Avatar image updated successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/change-coverImage",
    tag = "Users",
    operation_id = "changeCoverImage",
    summary = "Replace the cover image",
    request_body(content_type = "multipart/form-data", description = "`coverImage` image file"),
    responses(
        (status = 200, description = "Cover image updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Cover image file is missing", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 500, description = "Media upload failed", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.id()))]
pub async fn change_cover_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let form = MultipartForm::collect(multipart, &["coverImage"], &state.config.storage).await?;
    let updated = replace_profile_image(&state, &auth_user, form, ProfileImage::Cover).await?;
    Ok(ApiResponse::ok(
        UserResponse::from(updated),
        "Cover image updated successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/channel/{username}",
    tag = "Users",
    operation_id = "getChannelProfile",
    summary = "Get a channel profile",
    description = "Returns the channel owner's public profile with subscriber counts and \
        whether the requester is subscribed.",
    params(("username" = String, Path, description = "Channel username (case-insensitive)")),
    responses(
        (status = 200, description = "Channel profile", body = ApiResponse<ChannelProfileResponse>),
        (status = 400, description = "Username is missing", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Channel does not exist", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn channel_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<ApiResponse<ChannelProfileResponse>, AppError> {
    let username = normalize(&username);
    if username.is_empty() {
        return Err(AppError::Validation("Username is missing".into()));
    }

    let channel = user::Entity::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Channel does not exist".into()))?;

    let (subscribers_count, channels_subscribed_to_count, subscribed) = tokio::try_join!(
        subscription::Entity::find()
            .filter(subscription::Column::ChannelId.eq(channel.id))
            .count(&state.db),
        subscription::Entity::find()
            .filter(subscription::Column::SubscriberId.eq(channel.id))
            .count(&state.db),
        subscription::Entity::find_by_id((auth_user.id(), channel.id)).one(&state.db),
    )?;

    Ok(ApiResponse::ok(
        ChannelProfileResponse {
            id: channel.id,
            username: channel.username,
            full_name: channel.full_name,
            email: channel.email,
            avatar_url: channel.avatar_url,
            cover_image_url: channel.cover_image_url,
            subscribers_count,
            channels_subscribed_to_count,
            is_subscribed: subscribed.is_some(),
        },
        "User channel fetched successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/history",
    tag = "Users",
    operation_id = "getWatchHistory",
    summary = "Get the watch history",
    description = "Videos the user has opened, each listed once, in order of first viewing.",
    responses(
        (status = 200, description = "Watch history", body = ApiResponse<Vec<VideoListItem>>),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn watch_history(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<VideoListItem>>, AppError> {
    let video_ids: Vec<uuid::Uuid> = watch_history::Entity::find()
        .filter(watch_history::Column::UserId.eq(auth_user.id()))
        .order_by_asc(watch_history::Column::WatchedAt)
        .order_by_asc(watch_history::Column::VideoId)
        .select_only()
        .column(watch_history::Column::VideoId)
        .into_tuple()
        .all(&state.db)
        .await?;

    let items = videos_in_order(&state.db, &video_ids, auth_user.id()).await?;

    Ok(ApiResponse::ok(items, "Watch history fetched successfully"))
}

/// Record that `user_id` opened `video_id`. Re-watching keeps the first entry.
pub(crate) async fn record_view<C: ConnectionTrait>(
    db: &C,
    user_id: uuid::Uuid,
    video_id: uuid::Uuid,
) -> Result<(), DbErr> {
    let entry = watch_history::ActiveModel {
        user_id: Set(user_id),
        video_id: Set(video_id),
        watched_at: Set(Utc::now()),
    };

    let result = watch_history::Entity::insert(entry)
        .on_conflict(
            sea_orm::sea_query::OnConflict::columns([
                watch_history::Column::UserId,
                watch_history::Column::VideoId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}
