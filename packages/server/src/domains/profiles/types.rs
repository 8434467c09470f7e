//! Directory data types

use serde::{Deserialize, Serialize};

use super::models::UserProfile;
use crate::common::{AccountId, Role};

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: AccountId,
    pub name: Option<String>,
    pub role: Option<Role>,
}

impl From<&UserProfile> for DirectoryEntry {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.display_label().map(str::to_string),
            role: profile.role,
        }
    }
}

/// What the directory returns when a filtered query comes back empty.
///
/// With `fallback_to_all_on_empty` set, an empty doctor list returns every
/// profile and an empty assignment list returns every patient candidate.
/// That keeps dashboards populated while role tagging and assignments are
/// incomplete, at the cost of tenant isolation: a doctor with no assigned
/// patients sees all patients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryPolicy {
    pub fallback_to_all_on_empty: bool,
}

impl Default for DirectoryPolicy {
    fn default() -> Self {
        Self {
            fallback_to_all_on_empty: true,
        }
    }
}

impl DirectoryPolicy {
    pub fn strict() -> Self {
        Self {
            fallback_to_all_on_empty: false,
        }
    }
}

/// Input to `listPatientsForDoctor`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListPatientsInput {
    pub doctor_id: Option<String>,
}

/// The caller's own profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyProfile {
    pub id: AccountId,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub name: Option<String>,
}

impl From<UserProfile> for MyProfile {
    fn from(profile: UserProfile) -> Self {
        let name = profile.display_label().map(str::to_string);
        Self {
            id: profile.id,
            email: profile.email,
            role: profile.role,
            name,
        }
    }
}
