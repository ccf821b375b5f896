use async_trait::async_trait;

use crate::{entities::email::{MailReceipt, OutboundEmail}, errors::MailError};

#[async_trait]
pub trait MailSender: Send + Sync {
    /// Hands one message to the delivery provider.
    async fn send(&self, email: &OutboundEmail) -> Result<MailReceipt, MailError>;
}
