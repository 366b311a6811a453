//! Record service - Use cases over the record repository.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{sample_records, FindManyArgs, Record};
use crate::errors::AppResult;
use crate::infra::RecordRepository;

/// Record service trait for dependency injection.
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Every record, unfiltered, in store order
    async fn list_records(&self) -> AppResult<Vec<Record>>;

    /// Get record by ID
    async fn get_record(&self, id: i32) -> AppResult<Record>;

    /// Insert the sample rows, returning how many were inserted
    async fn seed(&self, skip_duplicates: bool) -> AppResult<u64>;
}

/// Concrete implementation of RecordService.
pub struct RecordManager {
    repo: Arc<dyn RecordRepository>,
}

impl RecordManager {
    /// Create new record service instance
    pub fn new(repo: Arc<dyn RecordRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl RecordService for RecordManager {
    async fn list_records(&self) -> AppResult<Vec<Record>> {
        self.repo.find_many(FindManyArgs::new()).await
    }

    async fn get_record(&self, id: i32) -> AppResult<Record> {
        self.repo.find_unique_or_throw(id).await
    }

    async fn seed(&self, skip_duplicates: bool) -> AppResult<u64> {
        let inserted = self
            .repo
            .create_many(sample_records(), skip_duplicates)
            .await?;

        tracing::info!(inserted, "Sample records inserted");
        Ok(inserted)
    }
}
