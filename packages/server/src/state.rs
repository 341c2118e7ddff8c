use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::utils::media::MediaGateway;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub media: MediaGateway,
}
