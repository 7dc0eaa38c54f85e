use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, courier::Courier, storage::ImageStore};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub jwt_secret: Arc<str>,
    pub images: ImageStore,
    pub courier: Option<Arc<dyn Courier>>,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, config: &AppConfig, courier: Option<Arc<dyn Courier>>) -> Self {
        Self {
            orm,
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
            images: ImageStore::new(&config.upload_dir),
            courier,
        }
    }
}
