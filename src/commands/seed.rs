//! Seed command - Inserts the sample records.

use std::sync::Arc;

use crate::cli::args::SeedArgs;
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{Database, RecordStore};
use crate::services::{RecordManager, RecordService};

/// Execute the seed command
pub async fn execute(args: SeedArgs, config: Config) -> AppResult<()> {
    let db = Database::connect(&config).await?;
    let service = RecordManager::new(Arc::new(RecordStore::new(db.get_connection())));

    let result = service.seed(args.skip_duplicates).await;
    db.close().await?;

    let inserted = result?;
    tracing::info!(inserted, "Database seeded successfully");
    Ok(())
}
