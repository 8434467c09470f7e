//! Auth domain data types
//!
//! Simple, serializable types returned by auth activities.

use serde::{Deserialize, Serialize};

use crate::common::{AccountId, ApiError, ApiResult, OtpRequestId, Role};

/// Result of issuing an OTP. Never carries the code or its digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpSent {
    pub rid: OtpRequestId,
    pub expires_in_minutes: i64,
}

/// Raw verification input as submitted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerifyOtpInput {
    pub rid: String,
    pub otp: String,
    pub email: String,
    pub password: String,
}

/// Result of a successful verification + provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCreated {
    pub uid: AccountId,
    pub role: Role,
}

/// Result of signing in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedIn {
    pub token: String,
    pub uid: AccountId,
    pub role: Option<Role>,
}

/// Session issued by an identity provider on sign-in.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub account_id: AccountId,
    pub token: String,
}

/// Authenticated caller, as established from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account_id: AccountId,
    pub email: String,
}

/// Fails with `Unauthenticated` when nobody is signed in.
pub fn require_caller(caller: Option<&CallerIdentity>) -> ApiResult<&CallerIdentity> {
    caller.ok_or_else(|| ApiError::unauthenticated("Not signed in."))
}

/// Failures reported by an identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("email already registered")]
    EmailAlreadyExists,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
