use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::{
    entities::email::{MailReceipt, OutboundEmail},
    errors::MailError,
    repositories::mailer::MailSender,
};

/// Mail sender backed by the Resend HTTP API (`POST /emails`).
#[derive(Clone)]
pub struct ResendClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
}

#[derive(Debug, Deserialize)]
struct SendSuccess {
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendFailure {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ResendClient {
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self, MailError> {
        let base = if api_url.ends_with('/') {
            api_url.to_string()
        } else {
            format!("{}/", api_url)
        };
        let endpoint = Url::parse(&base)
            .and_then(|url| url.join("emails"))
            .map_err(|e| MailError::Transport(format!("invalid Resend API URL: {}", e)))?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(ResendClient {
            client,
            endpoint,
            api_key: Zeroizing::new(api_key.to_string()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl MailSender for ResendClient {
    async fn send(&self, email: &OutboundEmail) -> Result<MailReceipt, MailError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.as_str())
            .json(email)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let failure: SendFailure = serde_json::from_str(&body).unwrap_or_default();
            return Err(MailError::Provider {
                status: status.as_u16(),
                name: failure.name.unwrap_or_else(|| "unknown_error".to_string()),
                message: failure.message.unwrap_or(body),
            });
        }

        let success: SendSuccess = serde_json::from_str(&body)
            .map_err(|e| MailError::UnexpectedResponse(format!("{}: {}", e, body)))?;

        match success.id {
            Some(id) if !id.trim().is_empty() => Ok(MailReceipt { id }),
            _ => Err(MailError::UnexpectedResponse("success response without an id".into())),
        }
    }
}

impl fmt::Debug for ResendClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResendClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
