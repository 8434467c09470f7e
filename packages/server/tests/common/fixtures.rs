//! Test fixtures for seeding profile records.

use chrono::{Duration, Utc};
use portal_core::common::{AccountId, Role};
use portal_core::domains::profiles::models::UserProfile;

/// A profile as written by signup
pub fn profile(email: &str, role: Role) -> UserProfile {
    UserProfile::new(AccountId::new(), email.to_string(), role, Utc::now())
}

/// A profile imported by other tooling: no role, no email
pub fn untagged_profile(name: &str) -> UserProfile {
    UserProfile {
        id: AccountId::new(),
        email: None,
        role: None,
        name: Some(name.to_string()),
        display_name: None,
        assigned_doctor_id: None,
        doctor_id: None,
        assigned_doctors: None,
        created_at: Utc::now() - Duration::days(30),
    }
}

/// A patient assigned through `assigned_doctor_id`
pub fn patient_assigned_to(email: &str, doctor: &UserProfile) -> UserProfile {
    let mut patient = profile(email, Role::Patient);
    patient.assigned_doctor_id = Some(doctor.id.to_string());
    patient
}
