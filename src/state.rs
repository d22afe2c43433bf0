use crate::config::AppConfig;
use crate::store::{self, ProductStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = store::connect(&config.database_url).await?;

        Ok(Self { store, config })
    }

    pub fn from_parts(store: Arc<dyn ProductStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }
}
