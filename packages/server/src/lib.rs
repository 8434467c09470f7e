// EchoCare Portal - Server Core
//
// Email OTP signup and the role-gated patient/doctor directory.
// Domains live in domains/*; infrastructure traits and adapters in kernel/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
