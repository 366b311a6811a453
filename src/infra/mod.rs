//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connection lifecycle and migrations
//! - The record repository and its query translation

pub mod db;
pub mod repositories;

pub use db::{Database, Migrator};
pub use repositories::{RecordRepository, RecordStore};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::MockRecordRepository;
