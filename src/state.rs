//! Shared state handed to every handler.

use crate::{
    config::AppConfig,
    services::{record_service::RecordService, storage_service::StorageService},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: StorageService,
    pub records: RecordService,
}

impl AppState {
    pub fn new(config: AppConfig, storage: StorageService, records: RecordService) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            records,
        }
    }
}
