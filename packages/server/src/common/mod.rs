// Common types and utilities shared across the application

pub mod entity_ids;
pub mod errors;
pub mod id;
pub mod types;
pub mod utils;

pub use entity_ids::*;
pub use errors::{ApiError, ApiResult};
pub use id::Id;
pub use types::*;
