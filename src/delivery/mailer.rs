use crate::config::{MailCredentials, SmtpConfig};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid email address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Invalid content type: {0}")]
    ContentType(String),

    #[error("Email template error: {0}")]
    Template(String),

    #[error("Attachment unavailable: {0}")]
    Attachment(#[from] std::io::Error),
}

/// One outgoing statement email with its PDF attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

/// Outgoing mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: StatementEmail) -> Result<(), MailError>;
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.trim().parse().map_err(|e: lettre::address::AddressError| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Builds a `multipart/mixed` message: plain-text body plus the PDF.
pub fn build_message(from: &Mailbox, email: StatementEmail) -> Result<Message, MailError> {
    let pdf = ContentType::parse("application/pdf")
        .map_err(|e| MailError::ContentType(e.to_string()))?;
    let attachment = Attachment::new(email.attachment_name).body(email.attachment, pdf);

    Ok(Message::builder()
        .from(from.clone())
        .to(mailbox(&email.to)?)
        .subject(email.subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(email.body))
                .singlepart(attachment),
        )?)
}

/// SMTP submission with STARTTLS and login credentials.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, credentials: &MailCredentials) -> Result<Self, MailError> {
        let sender = mailbox(&credentials.sender)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                credentials.sender.clone(),
                credentials.password.clone(),
            ))
            .timeout(Some(config.timeout()))
            .build();
        log::debug!(
            "SMTP transport configured for {}:{} as {}",
            config.host,
            config.port,
            credentials.sender
        );
        Ok(Self { transport, sender })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: StatementEmail) -> Result<(), MailError> {
        let message = build_message(&self.sender, email)?;
        let response = self.transport.send(message).await?;
        log::debug!("SMTP accepted message: {:?}", response.code());
        Ok(())
    }
}
