use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Lower-cased and trimmed.
    #[sea_orm(unique)]
    pub username: String,
    /// Lower-cased and trimmed.
    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    /// Argon2id PHC string.
    pub password: String,

    pub avatar_url: String,
    pub avatar_id: String,
    pub cover_image_url: Option<String>,
    pub cover_image_id: Option<String>,

    /// The single refresh token currently accepted for this user.
    #[sea_orm(column_type = "Text", nullable)]
    pub refresh_token: Option<String>,

    #[sea_orm(has_many)]
    pub videos: HasMany<super::video::Entity>,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
