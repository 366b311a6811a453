//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod teste;

// Re-exports for public API convenience
#[allow(unused_imports)]
pub use teste::{ActiveModel as TesteActiveModel, Entity as TesteEntity, Model as TesteModel};
