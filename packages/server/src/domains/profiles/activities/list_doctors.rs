use tracing::debug;

use crate::common::{ApiResult, Role};
use crate::domains::auth::types::{require_caller, CallerIdentity};
use crate::domains::profiles::types::DirectoryEntry;
use crate::kernel::ServerDeps;

/// Every doctor-tagged profile. With the permissive policy, an empty result
/// falls back to every profile so the picker is never blank.
pub async fn list_doctors(
    caller: Option<&CallerIdentity>,
    deps: &ServerDeps,
) -> ApiResult<Vec<DirectoryEntry>> {
    let caller = require_caller(caller)?;

    let mut doctors = deps.profiles.find_by_role(Role::Doctor).await?;
    if doctors.is_empty() && deps.directory_policy.fallback_to_all_on_empty {
        debug!(caller = %caller.account_id, "No doctor profiles, falling back to all profiles");
        doctors = deps.profiles.list_all().await?;
    }

    Ok(doctors.iter().map(DirectoryEntry::from).collect())
}
