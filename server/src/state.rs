use std::sync::Arc;

use crate::config::Config;
use crate::store::EntityStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}
