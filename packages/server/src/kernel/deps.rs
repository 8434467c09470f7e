//! Server dependencies for activities (using traits for testability)
//!
//! This module provides the central dependency container used by all domain activities.
//! All external services use trait abstractions to enable testing.

use anyhow::Result;
use async_trait::async_trait;
use mailer::{MailerOptions, MailerService};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::EmailConfig;
use crate::domains::profiles::types::DirectoryPolicy;
use crate::kernel::{
    BaseEmailService, BaseIdentityProvider, BaseOtpRequestStore, BaseProfileStore,
};

// =============================================================================
// MailerService Adapter (implements BaseEmailService trait)
// =============================================================================

/// Wrapper around MailerService that implements BaseEmailService trait
pub struct MailerAdapter(pub Arc<MailerService>);

impl MailerAdapter {
    pub fn new(service: Arc<MailerService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseEmailService for MailerAdapter {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.0
            .send(to, subject, body)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

/// Email service used when no mail credentials are configured.
///
/// Logs the recipient and subject and reports success.
pub struct NoopEmailService;

#[async_trait]
impl BaseEmailService for NoopEmailService {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
        warn!(to = %to, subject = %subject, "Email disabled, message not sent");
        Ok(())
    }
}

/// Pick the email transport for the given configuration
pub fn create_email_service(config: &EmailConfig) -> Result<Arc<dyn BaseEmailService>> {
    if !config.enabled {
        warn!("MAIL_USER/MAIL_PASS not set, verification emails will not be delivered");
        return Ok(Arc::new(NoopEmailService));
    }

    let service = MailerService::new(MailerOptions {
        host: config.host.clone(),
        port: config.port,
        username: config.username.clone(),
        password: config.password.clone(),
        from_name: config.from_name.clone(),
    })?;
    info!(host = %config.host, port = config.port, from = %service.from(), "SMTP mailer configured");

    Ok(Arc::new(MailerAdapter::new(Arc::new(service))))
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to activities (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub otp_requests: Arc<dyn BaseOtpRequestStore>,
    pub profiles: Arc<dyn BaseProfileStore>,
    /// Credential accounts and session tokens
    pub identity: Arc<dyn BaseIdentityProvider>,
    pub email: Arc<dyn BaseEmailService>,
    pub directory_policy: DirectoryPolicy,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        otp_requests: Arc<dyn BaseOtpRequestStore>,
        profiles: Arc<dyn BaseProfileStore>,
        identity: Arc<dyn BaseIdentityProvider>,
        email: Arc<dyn BaseEmailService>,
        directory_policy: DirectoryPolicy,
    ) -> Self {
        Self {
            otp_requests,
            profiles,
            identity,
            email,
            directory_policy,
        }
    }
}
