//! Auth domain - email OTP signup and sessions
//!
//! Responsibilities:
//! - Issuing six-digit codes by email and storing only their digest
//! - Verifying codes and provisioning the account + profile
//! - Session/JWT token management

pub mod activities;
pub mod jwt;
pub mod models;
pub mod otp;
pub mod password;
pub mod types;

pub use jwt::{Claims, JwtService};
