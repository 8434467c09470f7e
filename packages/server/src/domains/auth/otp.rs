//! OTP code generation and the verification email.

use rand::Rng;

/// How long an issued code stays valid.
pub const OTP_TTL_MINUTES: i64 = 10;

/// Failed code comparisons allowed per request before it is dead.
pub const MAX_OTP_ATTEMPTS: i32 = 5;

pub const OTP_EMAIL_SUBJECT: &str = "EchoCare Verification Code";

/// Uniform six-digit code in `100000..=999999`.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

pub fn otp_email_body(code: &str) -> String {
    format!(
        "Your EchoCare verification code is: {}\n\nThis code expires in {} minutes.",
        code, OTP_TTL_MINUTES
    )
}

/// Trim and lowercase an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
