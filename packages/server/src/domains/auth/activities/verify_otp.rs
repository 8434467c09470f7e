//! Verify OTP activity

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::common::utils::{digest, digests_match};
use crate::common::{ApiError, ApiResult, OtpRequestId};
use crate::domains::auth::otp::normalize_email;
use crate::domains::auth::types::{AccountCreated, IdentityError, VerifyOtpInput};
use crate::domains::profiles::models::UserProfile;
use crate::kernel::ServerDeps;

/// Check a submitted code and, on success, provision the account and profile.
///
/// The request is consumed (`used = true`) before the account is created and
/// is never reverted, even if provisioning then fails.
pub async fn verify_otp(input: VerifyOtpInput, deps: &ServerDeps) -> ApiResult<AccountCreated> {
    let code = input.otp.trim();
    let email = normalize_email(&input.email);
    let rid = input.rid.as_str();
    let password = input.password.as_str();

    if rid.is_empty() || code.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ApiError::invalid_argument(
            "rid, otp, email and password are required.",
        ));
    }

    // A malformed rid can't name a stored request
    let request = match OtpRequestId::parse(rid) {
        Ok(id) => deps.otp_requests.find_by_id(id).await?,
        Err(_) => None,
    }
    .ok_or_else(|| ApiError::not_found("OTP request not found."))?;

    let now = Utc::now();
    request.check_usable(&email, now)?;

    // The snapshot above may be stale; the slot is what gates the comparison
    let Some(attempts) = deps.otp_requests.reserve_attempt(request.id, now).await? else {
        return Err(current_rejection(
            request.id,
            &email,
            now,
            deps,
            ApiError::resource_exhausted("Too many attempts. Request a new OTP."),
        )
        .await);
    };

    if !digests_match(&digest(code), &request.otp_hash) {
        warn!(rid = %request.id, attempts, "Invalid OTP submitted");
        return Err(ApiError::unauthenticated("Invalid OTP."));
    }

    if !deps.otp_requests.mark_used(request.id, now).await? {
        info!(rid = %request.id, "OTP consumed by a concurrent verification");
        return Err(current_rejection(
            request.id,
            &email,
            now,
            deps,
            ApiError::failed_precondition("OTP already used."),
        )
        .await);
    }

    let account_id = match deps.identity.create_account(&email, password, true).await {
        Ok(id) => id,
        Err(IdentityError::EmailAlreadyExists) => {
            return Err(ApiError::already_exists(
                "Email already registered. Please sign in.",
            ));
        }
        Err(e) => {
            error!(rid = %request.id, error = %e, "Failed to create account");
            return Err(ApiError::internal("Failed to create user."));
        }
    };

    deps.profiles
        .create(UserProfile::new(account_id, email, request.role, now))
        .await?;

    info!(rid = %request.id, account_id = %account_id, role = %request.role, "Account provisioned");

    Ok(AccountCreated {
        uid: account_id,
        role: request.role,
    })
}

/// Re-reads a request whose conditional update was refused and reports the
/// first check it now fails, or `fallback` if it passes them all.
async fn current_rejection(
    id: OtpRequestId,
    email: &str,
    now: DateTime<Utc>,
    deps: &ServerDeps,
    fallback: ApiError,
) -> ApiError {
    match deps.otp_requests.find_by_id(id).await {
        Ok(Some(current)) => current.check_usable(email, now).err().unwrap_or(fallback),
        Ok(None) => ApiError::not_found("OTP request not found."),
        Err(e) => e.into(),
    }
}
