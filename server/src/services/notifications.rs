//! Contract notification service
//!
//! Best-effort email to the configured recipients once a document is
//! generated. Delivery runs detached from the request; failures are logged
//! and swallowed, never surfaced to the caller.

use std::sync::Arc;

use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use tracing::{info, warn};

use crate::config::{Settings, SmtpSettings};

pub struct NotificationService {
    smtp: Option<SmtpSettings>,
    recipients: Vec<String>,
}

impl NotificationService {
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.smtp.is_some() && !settings.contract_email_recipients.is_empty() {
            info!(
                recipients = settings.contract_email_recipients.len(),
                "Contract email notifications configured"
            );
        }
        Self {
            smtp: settings.smtp.clone(),
            recipients: settings.contract_email_recipients.clone(),
        }
    }

    pub fn has_channel(&self) -> bool {
        self.smtp.is_some() && !self.recipients.is_empty()
    }

    /// Send one message to every configured recipient.
    pub async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        let Some(smtp) = self.smtp.clone() else {
            return Ok(());
        };

        let subject = subject.to_string();
        let body = body.to_string();
        let recipients = self.recipients.clone();

        tokio::task::spawn_blocking(move || {
            let mailer = SmtpTransport::relay(&smtp.host)
                .context("Failed to build SMTP transport")?
                .port(smtp.port)
                .credentials(Credentials::new(
                    smtp.username.clone(),
                    smtp.password.expose_secret().to_string(),
                ))
                .build();

            for recipient in &recipients {
                let email = Message::builder()
                    .from(smtp.from_address.parse().context("Invalid from address")?)
                    .to(recipient.parse().context("Invalid recipient address")?)
                    .subject(subject.clone())
                    .header(ContentType::TEXT_PLAIN)
                    .body(body.clone())
                    .context("Failed to build email")?;
                mailer.send(&email).context("Failed to send email")?;
            }
            anyhow::Ok(())
        })
        .await?
    }
}

/// Fire-and-forget dispatch: spawn the send and log failures.
pub fn notify_contract_generated_nonblocking(
    service: Arc<NotificationService>,
    contract_number: String,
    client_name: String,
    document_path: String,
) {
    if !service.has_channel() {
        return;
    }
    tokio::spawn(async move {
        let subject = format!("Su contrato está disponible - {contract_number}");
        let body = format!(
            "Estimado/a {client_name},\n\n\
             Su contrato {contract_number} ha sido generado exitosamente y está \
             disponible para revisión en: {document_path}\n"
        );
        if let Err(err) = service.notify(&subject, &body).await {
            warn!(%contract_number, error = %err, "Contract notification failed (non-blocking)");
        }
    });
}
