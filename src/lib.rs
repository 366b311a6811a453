//! Roster - a student roster served from a single relational table.
//!
//! The crate pairs a typed data-access layer for the `teste` table with a
//! server-rendered page that lists every record.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Records plus the argument/result types of every query
//! - **services**: Application use cases over the repository
//! - **infra**: Database handle, migrations and the record repository
//! - **api**: HTTP router, state and handlers
//! - **views**: HTML rendering
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//!
//! # Insert the sample records
//! cargo run -- seed
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod views;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{NewRecord, Record, RecordPatch};
pub use errors::{AppError, AppResult};
pub use infra::{Database, RecordRepository, RecordStore};
