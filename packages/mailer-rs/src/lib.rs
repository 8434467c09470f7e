//! Minimal async SMTP client for transactional mail.
//!
//! Port 465 uses implicit TLS, any other port negotiates STARTTLS.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("invalid mailer configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("smtp send failed: {0}")]
    Send(String),
}

#[derive(Debug, Clone)]
pub struct MailerOptions {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Display name used in the From header, e.g. `EchoCare`.
    pub from_name: String,
}

#[derive(Clone)]
pub struct MailerService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl MailerService {
    pub fn new(options: MailerOptions) -> Result<Self, MailerError> {
        let builder = if options.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&options.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&options.host)
        }
        .map_err(|e| MailerError::InvalidConfig(e.to_string()))?;

        let transport = builder
            .port(options.port)
            .credentials(Credentials::new(
                options.username.clone(),
                options.password,
            ))
            .build();

        let from = format!("{} <{}>", options.from_name, options.username);
        let from = from.parse::<Mailbox>().map_err(|e| MailerError::InvalidAddress {
            address: from.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self { transport, from })
    }

    /// The mailbox messages are sent from.
    pub fn from(&self) -> &Mailbox {
        &self.from
    }

    /// Send a plain-text message.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        let message = build_message(self.from.clone(), to, subject, body)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailerError::Send(e.to_string()))?;

        tracing::debug!(to = %to, subject = %subject, "Mail accepted by SMTP relay");
        Ok(())
    }
}

fn build_message(from: Mailbox, to: &str, subject: &str, body: &str) -> Result<Message, MailerError> {
    let to = to.parse::<Mailbox>().map_err(|e| MailerError::InvalidAddress {
        address: to.to_string(),
        reason: e.to_string(),
    })?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| MailerError::Build(e.to_string()))
}
