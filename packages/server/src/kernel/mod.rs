//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod identity;
pub mod postgres;
pub mod test_dependencies;
pub mod traits;

pub use deps::{create_email_service, MailerAdapter, NoopEmailService, ServerDeps};
pub use identity::PostgresIdentityProvider;
pub use postgres::{PostgresOtpRequestStore, PostgresProfileStore};
pub use test_dependencies::TestDependencies;
pub use traits::*;
