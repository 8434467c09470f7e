//! Profiles domain - role records and the role-gated directory

pub mod activities;
pub mod models;
pub mod types;
