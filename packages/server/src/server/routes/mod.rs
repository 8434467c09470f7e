// HTTP routes
pub mod callable;
pub mod directory_http;
pub mod health;

pub use callable::*;
pub use directory_http::*;
pub use health::*;
