//! HTTP request handlers.

pub mod record_handler;

pub use record_handler::record_routes;
