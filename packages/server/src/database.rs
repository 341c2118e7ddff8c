use std::time::Duration;

use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::entity::{comment, subscription, video, video_like, watch_history};

/// Process-wide connection, created on first use.
static CONNECTION: OnceCell<DatabaseConnection> = OnceCell::const_new();

/// Return the shared connection, connecting on the first call.
///
/// Concurrent callers wait for the same attempt. A failed attempt leaves the
/// cell empty so the next call retries.
pub async fn acquire(config: &DatabaseConfig) -> Result<&'static DatabaseConnection, DbErr> {
    CONNECTION
        .get_or_try_init(|| init_db(&config.url, config.max_connections))
        .await
}

pub async fn init_db(db_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("vidhub_server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Full-text expression matched by the listing search. Must stay identical to
/// the indexed expression for the planner to use the GIN index.
pub const VIDEO_SEARCH_VECTOR: &str =
    r#"to_tsvector('simple', "video"."title" || ' ' || "video"."description")"#;

async fn ensure_index(db: &DatabaseConnection, name: &str, stmt: &str) {
    match db.execute_unprepared(stmt).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
    }
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't create composite or expression indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let search = format!(
        r#"CREATE INDEX IF NOT EXISTS "idx_video_search" ON "video" USING GIN (({VIDEO_SEARCH_VECTOR}))"#
    );
    ensure_index(db, "idx_video_search", &search).await;

    // Listing: WHERE is_published ORDER BY created_at DESC
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_video_published_created")
        .table(video::Entity)
        .col(video::Column::IsPublished)
        .col(video::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);
    ensure_index(db, "idx_video_published_created", &stmt).await;

    let stmt = Index::create()
        .if_not_exists()
        .name("idx_video_owner_created")
        .table(video::Entity)
        .col(video::Column::OwnerId)
        .col(video::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);
    ensure_index(db, "idx_video_owner_created", &stmt).await;

    let stmt = Index::create()
        .if_not_exists()
        .name("idx_comment_video_created")
        .table(comment::Entity)
        .col(comment::Column::VideoId)
        .col(comment::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);
    ensure_index(db, "idx_comment_video_created", &stmt).await;

    // Subscriber counts look up by channel; the primary key leads with subscriber.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_subscription_channel")
        .table(subscription::Entity)
        .col(subscription::Column::ChannelId)
        .to_string(PostgresQueryBuilder);
    ensure_index(db, "idx_subscription_channel", &stmt).await;

    let stmt = Index::create()
        .if_not_exists()
        .name("idx_video_like_user_created")
        .table(video_like::Entity)
        .col(video_like::Column::LikedBy)
        .col(video_like::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);
    ensure_index(db, "idx_video_like_user_created", &stmt).await;

    let stmt = Index::create()
        .if_not_exists()
        .name("idx_watch_history_user_watched")
        .table(watch_history::Entity)
        .col(watch_history::Column::UserId)
        .col(watch_history::Column::WatchedAt)
        .to_string(PostgresQueryBuilder);
    ensure_index(db, "idx_watch_history_user_watched", &stmt).await;

    Ok(())
}
