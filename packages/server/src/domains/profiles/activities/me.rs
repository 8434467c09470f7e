use crate::common::{ApiError, ApiResult};
use crate::domains::auth::types::{require_caller, CallerIdentity};
use crate::domains::profiles::types::MyProfile;
use crate::kernel::ServerDeps;

/// The caller's own profile, used by clients to route by role after sign-in.
pub async fn me(caller: Option<&CallerIdentity>, deps: &ServerDeps) -> ApiResult<MyProfile> {
    let caller = require_caller(caller)?;

    deps.profiles
        .find_by_id(caller.account_id)
        .await?
        .map(MyProfile::from)
        .ok_or_else(|| ApiError::not_found("Profile not found."))
}
