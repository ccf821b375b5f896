use std::sync::Arc;

use crate::{
    entities::{
        contact::{ContactResponse, ContactSubmission, SanitizedContactSubmission, SUCCESS_MSG},
        email::{MailSettings, OutboundEmail},
    },
    errors::{AppError, MailError},
    repositories::mailer::MailSender,
};

pub type SharedMailer = Arc<dyn MailSender>;

/// Validates contact submissions and relays them to the mail provider.
pub struct ContactHandler {
    /// `None` when no provider credential is configured.
    pub mailer: Option<SharedMailer>,
    pub settings: MailSettings,
}

impl ContactHandler {
    pub fn new(mailer: Option<SharedMailer>, settings: MailSettings) -> Self {
        ContactHandler { mailer, settings }
    }

    pub fn is_configured(&self) -> bool {
        self.mailer.is_some()
    }

    /// Validates, sanitizes and sends one submission.
    pub async fn send_contact_message(
        &self,
        request: ContactSubmission,
    ) -> Result<ContactResponse, AppError> {
        let submission: SanitizedContactSubmission = request.try_into()?;

        let mailer = self.mailer.as_ref().ok_or_else(|| {
            tracing::error!("Mail provider API key is not configured");
            AppError::ServerMisconfigured("missing mail provider API key".into())
        })?;

        let email = OutboundEmail::from_submission(&self.settings, &submission);

        tracing::info!(
            name = %submission.name,
            email = %submission.email,
            message_len = submission.message.chars().count(),
            "Dispatching contact message"
        );

        match mailer.send(&email).await {
            Ok(receipt) => {
                tracing::info!(id = %receipt.id, "Contact message accepted by provider");
                Ok(ContactResponse {
                    message: SUCCESS_MSG.to_string(),
                    id: receipt.id,
                })
            }
            Err(e @ MailError::Provider { .. }) => {
                tracing::error!(error = %e, "Mail provider rejected contact message");
                Err(e.into())
            }
            Err(e) => {
                tracing::error!(error = %e, "Unexpected failure while sending contact message");
                Err(e.into())
            }
        }
    }
}
