//! Shared application state for all routes.

use crate::service::RecordService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub records: Arc<RecordService>,
}

impl AppState {
    pub fn new(records: RecordService) -> Self {
        AppState {
            records: Arc::new(records),
        }
    }
}
