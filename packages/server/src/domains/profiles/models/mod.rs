pub mod profile;

pub use profile::{AssignmentField, UserProfile};
