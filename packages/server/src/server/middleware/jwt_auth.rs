use crate::domains::auth::types::CallerIdentity;
use crate::kernel::BaseIdentityProvider;
use axum::{extract::Request, http::header::AUTHORIZATION, middleware::Next, response::Response};
use std::sync::Arc;
use tracing::debug;

/// JWT authentication middleware
///
/// Extracts the session token from the Authorization header, verifies it with the
/// identity provider, and adds `CallerIdentity` to request extensions.
/// If no token or invalid token, request continues without a caller; each
/// operation decides whether that is allowed.
pub async fn jwt_auth_middleware(
    identity: Arc<dyn BaseIdentityProvider>,
    mut request: Request,
    next: Next,
) -> Response {
    // Owned so no borrow of the request is held across the await
    if let Some(token) = extract_token(&request).map(str::to_string) {
        match identity.verify_token(&token).await {
            Ok(caller) => {
                debug!(account_id = %caller.account_id, "Authenticated caller");
                request.extensions_mut().insert(caller);
            }
            Err(e) => debug!(error = %e, "Rejected session token"),
        }
    }

    next.run(request).await
}

/// Token from the Authorization header (handle both "Bearer <token>" and raw token)
fn extract_token(request: &Request) -> Option<&str> {
    let auth_str = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).trim();
    (!token.is_empty()).then_some(token)
}

/// Caller established by `jwt_auth_middleware`, if any
pub fn caller_of(request_caller: &Option<axum::Extension<CallerIdentity>>) -> Option<&CallerIdentity> {
    request_caller.as_ref().map(|axum::Extension(caller)| caller)
}
