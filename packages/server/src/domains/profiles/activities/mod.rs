//! Directory activities
//!
//! All of these require an authenticated caller; authorization is decided
//! from the caller's profile role, never from token claims.

mod list_doctors;
mod list_patients;
mod me;

pub use list_doctors::list_doctors;
pub use list_patients::{list_patients_for_doctor, select_patients};
pub use me::me;
