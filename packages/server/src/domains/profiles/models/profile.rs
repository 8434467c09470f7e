use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::{AccountId, Role};

/// Per-account profile record, keyed by the identity provider's account id.
///
/// `role` is authoritative for every authorization decision. Profiles loaded
/// by other tooling may be untagged (`role = None`) and may carry directory
/// metadata: a display name and any of three doctor-assignment fields.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UserProfile {
    pub id: AccountId,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub assigned_doctor_id: Option<String>,
    pub doctor_id: Option<String>,
    pub assigned_doctors: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

/// Which field ties a patient to a doctor. Resolved once per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentField {
    ByDoctorId(String),
    ByAltDoctorId(String),
    ByDoctorList(Vec<String>),
}

impl AssignmentField {
    pub fn names(&self, doctor_id: &str) -> bool {
        match self {
            Self::ByDoctorId(id) | Self::ByAltDoctorId(id) => id == doctor_id,
            Self::ByDoctorList(ids) => ids.iter().any(|id| id == doctor_id),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl UserProfile {
    /// Profile written right after a successful signup verification.
    pub fn new(id: AccountId, email: String, role: Role, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            email: Some(email),
            role: Some(role),
            name: None,
            display_name: None,
            assigned_doctor_id: None,
            doctor_id: None,
            assigned_doctors: None,
            created_at,
        }
    }

    /// First of name, display name, email that is present and non-empty.
    pub fn display_label(&self) -> Option<&str> {
        non_empty(&self.name)
            .or_else(|| non_empty(&self.display_name))
            .or_else(|| non_empty(&self.email))
    }

    /// Patients and untagged profiles are both treated as patients.
    pub fn is_patient_candidate(&self) -> bool {
        matches!(self.role, None | Some(Role::Patient))
    }

    /// `assigned_doctor_id`, then `doctor_id`, then `assigned_doctors`.
    /// Empty ids count as absent; an empty list still counts as present.
    pub fn assignment(&self) -> Option<AssignmentField> {
        if let Some(id) = non_empty(&self.assigned_doctor_id) {
            return Some(AssignmentField::ByDoctorId(id.to_string()));
        }
        if let Some(id) = non_empty(&self.doctor_id) {
            return Some(AssignmentField::ByAltDoctorId(id.to_string()));
        }
        self.assigned_doctors
            .clone()
            .map(AssignmentField::ByDoctorList)
    }

    pub fn is_assigned_to(&self, doctor_id: &str) -> bool {
        self.assignment()
            .map(|field| field.names(doctor_id))
            .unwrap_or(false)
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl UserProfile {
    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, role, name, display_name,
                assigned_doctor_id, doctor_id, assigned_doctors, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(self.id)
        .bind(&self.email)
        .bind(self.role)
        .bind(&self.name)
        .bind(&self.display_name)
        .bind(&self.assigned_doctor_id)
        .bind(&self.doctor_id)
        .bind(&self.assigned_doctors)
        .bind(self.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(id: AccountId, pool: &PgPool) -> Result<Option<Self>> {
        let profile = sqlx::query_as::<_, UserProfile>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(profile)
    }

    pub async fn find_by_role(role: Role, pool: &PgPool) -> Result<Vec<Self>> {
        let profiles = sqlx::query_as::<_, UserProfile>(
            "SELECT * FROM users WHERE role = $1 ORDER BY created_at",
        )
        .bind(role)
        .fetch_all(pool)
        .await?;
        Ok(profiles)
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let profiles =
            sqlx::query_as::<_, UserProfile>("SELECT * FROM users ORDER BY created_at")
                .fetch_all(pool)
                .await?;
        Ok(profiles)
    }
}
