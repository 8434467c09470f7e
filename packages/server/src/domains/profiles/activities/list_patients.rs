use tracing::debug;

use crate::common::{ApiError, ApiResult, Role};
use crate::domains::auth::types::{require_caller, CallerIdentity};
use crate::domains::profiles::models::UserProfile;
use crate::domains::profiles::types::{DirectoryEntry, DirectoryPolicy, ListPatientsInput};
use crate::kernel::ServerDeps;

/// Patients assigned to a doctor.
///
/// Callers must hold the doctor or admin role. A doctor may omit `doctor_id`
/// to mean themselves; an admin must name one.
pub async fn list_patients_for_doctor(
    caller: Option<&CallerIdentity>,
    input: ListPatientsInput,
    deps: &ServerDeps,
) -> ApiResult<Vec<DirectoryEntry>> {
    let caller = require_caller(caller)?;

    let caller_role = deps
        .profiles
        .find_by_id(caller.account_id)
        .await?
        .and_then(|profile| profile.role);
    if !caller_role.is_some_and(|role| role.can_list_patients()) {
        return Err(ApiError::permission_denied("Not authorized to list patients."));
    }

    let doctor_id = match input.doctor_id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None if caller_role == Some(Role::Doctor) => caller.account_id.to_string(),
        None => {
            return Err(ApiError::invalid_argument(
                "doctorId is required for non-doctor callers.",
            ));
        }
    };

    let all = deps.profiles.list_all().await?;
    let patients = select_patients(&all, &doctor_id, deps.directory_policy);
    debug!(doctor_id = %doctor_id, count = patients.len(), "Listed patients");

    Ok(patients.into_iter().map(DirectoryEntry::from).collect())
}

/// Patient candidates assigned to `doctor_id`, or every candidate when none
/// are assigned and the policy allows it.
pub fn select_patients<'a>(
    profiles: &'a [UserProfile],
    doctor_id: &str,
    policy: DirectoryPolicy,
) -> Vec<&'a UserProfile> {
    let candidates: Vec<&UserProfile> = profiles
        .iter()
        .filter(|p| p.is_patient_candidate())
        .collect();

    let assigned: Vec<&UserProfile> = candidates
        .iter()
        .copied()
        .filter(|p| p.is_assigned_to(doctor_id))
        .collect();

    if !assigned.is_empty() {
        assigned
    } else if policy.fallback_to_all_on_empty {
        candidates
    } else {
        Vec::new()
    }
}
