// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// OTP validation and directory filtering live in the domain activities that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseOtpRequestStore, BaseEmailService)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::common::{AccountId, OtpRequestId, Role};
use crate::domains::auth::models::{NewOtpRequest, OtpRequest};
use crate::domains::auth::types::{CallerIdentity, IdentityError, IssuedSession};
use crate::domains::profiles::models::UserProfile;

// =============================================================================
// OTP Request Store
// =============================================================================

#[async_trait]
pub trait BaseOtpRequestStore: Send + Sync {
    /// Persist a new request and return it with its store-assigned id
    async fn create(&self, request: NewOtpRequest) -> Result<OtpRequest>;

    async fn find_by_id(&self, id: OtpRequestId) -> Result<Option<OtpRequest>>;

    /// Claim one comparison slot before a code is checked.
    ///
    /// Atomically increments `attempts` only while the request is unused,
    /// unexpired at `now`, and below the attempt limit. Returns the new count,
    /// or `None` when no slot could be claimed.
    async fn reserve_attempt(&self, id: OtpRequestId, now: DateTime<Utc>) -> Result<Option<i32>>;

    /// Compare-and-set `used` from false to true for an unexpired request,
    /// handing back the slot claimed by `reserve_attempt`.
    ///
    /// Returns false if the request was already used (another verifier won)
    /// or expired in the meantime.
    async fn mark_used(&self, id: OtpRequestId, verified_at: DateTime<Utc>) -> Result<bool>;
}

// =============================================================================
// Profile Store
// =============================================================================

#[async_trait]
pub trait BaseProfileStore: Send + Sync {
    async fn create(&self, profile: UserProfile) -> Result<()>;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<UserProfile>>;

    async fn find_by_role(&self, role: Role) -> Result<Vec<UserProfile>>;

    async fn list_all(&self) -> Result<Vec<UserProfile>>;
}

// =============================================================================
// Identity Provider
// =============================================================================

#[async_trait]
pub trait BaseIdentityProvider: Send + Sync {
    /// Create a credential account. Fails with `EmailAlreadyExists` on collision.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        email_verified: bool,
    ) -> Result<AccountId, IdentityError>;

    /// Exchange email + password for a session token
    async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedSession, IdentityError>;

    /// Resolve a session token to the caller it was issued to
    async fn verify_token(&self, token: &str) -> Result<CallerIdentity, IdentityError>;
}

// =============================================================================
// Email Trait
// =============================================================================

#[async_trait]
pub trait BaseEmailService: Send + Sync {
    /// Send a plain-text message
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}
