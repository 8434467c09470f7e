//! Sign-in activity

use tracing::info;

use crate::common::{ApiError, ApiResult};
use crate::domains::auth::otp::normalize_email;
use crate::domains::auth::types::{IdentityError, SignedIn};
use crate::kernel::ServerDeps;

/// Exchange credentials for a session token. The role comes from the profile.
pub async fn sign_in(email: &str, password: &str, deps: &ServerDeps) -> ApiResult<SignedIn> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::invalid_argument("email and password are required."));
    }

    let session = match deps.identity.sign_in(&email, password).await {
        Ok(session) => session,
        Err(IdentityError::Other(e)) => return Err(e.into()),
        Err(_) => return Err(ApiError::unauthenticated("Invalid email or password.")),
    };

    let role = deps
        .profiles
        .find_by_id(session.account_id)
        .await?
        .and_then(|profile| profile.role);

    info!(account_id = %session.account_id, "Signed in");

    Ok(SignedIn {
        token: session.token,
        uid: session.account_id,
        role,
    })
}
