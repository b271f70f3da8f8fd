use async_trait::async_trait;
use chrono::{DateTime, Local};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use super::reporter::DealReporter;
use super::Notifier;
use crate::core::{EmailConfig, NotificationError};
use crate::scanner::ProductEntry;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends the deal alert through an authenticated STARTTLS relay. One attempt only.
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn build_message(
        &self,
        deals: &[ProductEntry],
        threshold: f64,
        sent_at: DateTime<Local>,
    ) -> Result<Message, NotificationError> {
        let reporter = DealReporter::new(threshold);
        let from: Mailbox = self.config.from_address.parse()?;
        let to: Mailbox = self.config.to_address.parse()?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(reporter.email_subject(deals))
            .header(ContentType::TEXT_PLAIN)
            .body(reporter.email_body(deals, sent_at))
            .map_err(|e| NotificationError::Build(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, deals: &[ProductEntry], threshold: f64) -> Result<(), NotificationError> {
        let message = self.build_message(deals, threshold, Local::now())?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
            .port(self.config.smtp_port)
            .timeout(Some(SMTP_TIMEOUT))
            .credentials(Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            ))
            .build();

        mailer.send(message).await?;

        tracing::info!("📧 Alert email sent to {}", self.config.to_address);
        Ok(())
    }
}
