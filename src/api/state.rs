//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::infra::{Database, RecordStore};
use crate::services::{RecordManager, RecordService};

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Record service
    pub record_service: Arc<dyn RecordService>,
    /// Database handle, used for health checks
    pub database: Arc<Database>,
}

impl AppState {
    /// Wire the record store and service over an open database.
    pub fn from_database(database: Arc<Database>) -> Self {
        let repo = Arc::new(RecordStore::new(database.get_connection()));
        let record_service = Arc::new(RecordManager::new(repo));

        Self {
            record_service,
            database,
        }
    }

    /// Create new application state with manually injected services.
    pub fn new(record_service: Arc<dyn RecordService>, database: Arc<Database>) -> Self {
        Self {
            record_service,
            database,
        }
    }
}
