//! Send OTP activity

use chrono::Utc;
use tracing::{error, info};

use crate::common::{ApiError, ApiResult, Role};
use crate::domains::auth::models::NewOtpRequest;
use crate::domains::auth::otp::{
    generate_code, normalize_email, otp_email_body, OTP_EMAIL_SUBJECT, OTP_TTL_MINUTES,
};
use crate::domains::auth::types::OtpSent;
use crate::kernel::ServerDeps;

/// Issue a one-time code for `email` and mail it.
///
/// The request is persisted before the email goes out. If delivery fails the
/// call fails, but the stored request is kept (it simply goes unused).
pub async fn send_otp(email: &str, role: Option<&str>, deps: &ServerDeps) -> ApiResult<OtpSent> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(ApiError::invalid_argument("Email is required."));
    }

    let role: Role = role
        .unwrap_or_default()
        .parse()
        .map_err(|_| ApiError::invalid_argument("Invalid role."))?;

    let code = generate_code();
    let request = deps
        .otp_requests
        .create(NewOtpRequest::new(email.clone(), role, &code, Utc::now()))
        .await?;

    info!(rid = %request.id, role = %role, "OTP request created");

    if let Err(e) = deps
        .email
        .send(&email, OTP_EMAIL_SUBJECT, &otp_email_body(&code))
        .await
    {
        error!(rid = %request.id, error = %e, "Failed to send verification email");
        return Err(ApiError::internal("Failed to send verification email."));
    }

    Ok(OtpSent {
        rid: request.id,
        expires_in_minutes: OTP_TTL_MINUTES,
    })
}
