use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::common::utils::digest;
use crate::common::{ApiError, ApiResult, OtpRequestId, Role};
use crate::domains::auth::otp::{MAX_OTP_ATTEMPTS, OTP_TTL_MINUTES};

/// One pending signup verification.
///
/// Only the digest of the code is stored. Requests are never deleted here;
/// expiry is a timestamp comparison.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpRequest {
    pub id: OtpRequestId,
    pub email: String,
    pub role: Role,
    pub otp_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

/// Fields supplied at issuance; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewOtpRequest {
    pub email: String,
    pub role: Role,
    pub otp_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NewOtpRequest {
    /// Hashes `code` and stamps a fixed ten minute expiry from `now`.
    pub fn new(email: String, role: Role, code: &str, now: DateTime<Utc>) -> Self {
        Self {
            email,
            role,
            otp_hash: digest(code),
            created_at: now,
            expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
        }
    }

    pub fn into_request(self, id: OtpRequestId) -> OtpRequest {
        OtpRequest {
            id,
            email: self.email,
            role: self.role,
            otp_hash: self.otp_hash,
            expires_at: self.expires_at,
            used: false,
            attempts: 0,
            created_at: self.created_at,
            verified_at: None,
        }
    }
}

impl OtpRequest {
    /// Whether another code comparison may be started at `now`.
    pub fn accepts_attempt_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && !self.is_expired_at(now) && self.attempts < MAX_OTP_ATTEMPTS
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Checks that must pass before the submitted code is even looked at.
    ///
    /// Order is observable: used, then expiry, then email, then attempts.
    /// `email` must already be normalized.
    pub fn check_usable(&self, email: &str, now: DateTime<Utc>) -> ApiResult<()> {
        if self.used {
            return Err(ApiError::failed_precondition("OTP already used."));
        }
        if self.is_expired_at(now) {
            return Err(ApiError::deadline_exceeded("OTP expired."));
        }
        if self.email != email {
            return Err(ApiError::permission_denied("Email mismatch."));
        }
        if self.attempts >= MAX_OTP_ATTEMPTS {
            return Err(ApiError::resource_exhausted(
                "Too many attempts. Request a new OTP.",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl OtpRequest {
    pub async fn insert(new: NewOtpRequest, pool: &PgPool) -> Result<Self> {
        let request = sqlx::query_as::<_, OtpRequest>(
            r#"
            INSERT INTO otp_requests (id, email, role, otp_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(OtpRequestId::new())
        .bind(&new.email)
        .bind(new.role)
        .bind(&new.otp_hash)
        .bind(new.expires_at)
        .bind(new.created_at)
        .fetch_one(pool)
        .await?;
        Ok(request)
    }

    pub async fn find_by_id(id: OtpRequestId, pool: &PgPool) -> Result<Option<Self>> {
        let request = sqlx::query_as::<_, OtpRequest>("SELECT * FROM otp_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(request)
    }

    /// Conditional `attempts + 1`; `None` when the request is used, expired
    /// or already at the limit.
    pub async fn reserve_attempt(
        id: OtpRequestId,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<i32>> {
        let attempts = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE otp_requests
            SET attempts = attempts + 1
            WHERE id = $1 AND used = false AND expires_at > $2 AND attempts < $3
            RETURNING attempts
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(MAX_OTP_ATTEMPTS)
        .fetch_optional(pool)
        .await?;
        Ok(attempts)
    }

    /// Compare-and-set `used`: true only for the caller that flipped it.
    /// The slot taken by `reserve_attempt` is returned, so `attempts` keeps
    /// counting wrong codes only.
    pub async fn mark_used(
        id: OtpRequestId,
        verified_at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<bool> {
        let flipped = sqlx::query_scalar::<_, OtpRequestId>(
            r#"
            UPDATE otp_requests
            SET used = true, verified_at = $2, attempts = GREATEST(attempts - 1, 0)
            WHERE id = $1 AND used = false AND expires_at > $2
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(verified_at)
        .fetch_optional(pool)
        .await?;
        Ok(flipped.is_some())
    }
}
