use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::{EmailError, EmailMessage, EmailSender};
use crate::config::{EmailConfig, EmailProviderId};

/// Logs outgoing mail instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            bytes = message.html.len(),
            "email delivery skipped (log provider)"
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SendGridEmailSender {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_email: String,
    from_name: String,
}

impl SendGridEmailSender {
    pub fn new(cfg: &EmailConfig, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: cfg.api_url.clone(),
            api_key,
            from_email: cfg.from_email.clone(),
            from_name: cfg.from_name.clone(),
        }
    }

    fn payload(&self, message: &EmailMessage) -> serde_json::Value {
        json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": self.from_email, "name": self.from_name },
            "subject": message.subject,
            "content": [{ "type": "text/html", "value": message.html }],
        })
    }
}

#[async_trait]
impl EmailSender for SendGridEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.payload(message))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(EmailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

pub fn build_sender(cfg: &EmailConfig) -> anyhow::Result<Arc<dyn EmailSender>> {
    match cfg.provider {
        EmailProviderId::Log => Ok(Arc::new(LogEmailSender)),
        EmailProviderId::SendGrid => {
            let api_key = cfg
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("email.api_key is required for sendgrid"))?;
            Ok(Arc::new(SendGridEmailSender::new(cfg, api_key)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SendGridEmailSender, build_sender};
    use crate::config::{EmailConfig, EmailProviderId};
    use crate::mail::EmailMessage;

    #[test]
    fn sendgrid_payload_carries_sender_and_html() {
        let cfg = EmailConfig {
            from_email: "bookings@example.com".to_string(),
            from_name: "Bookings".to_string(),
            ..Default::default()
        };
        let sender = SendGridEmailSender::new(&cfg, "key".to_string());
        let payload = sender.payload(&EmailMessage {
            to: "alice@example.com".to_string(),
            subject: "Reset".to_string(),
            html: "<p>hi</p>".to_string(),
        });

        assert_eq!(payload["personalizations"][0]["to"][0]["email"], "alice@example.com");
        assert_eq!(payload["from"]["email"], "bookings@example.com");
        assert_eq!(payload["from"]["name"], "Bookings");
        assert_eq!(payload["content"][0]["type"], "text/html");
        assert_eq!(payload["content"][0]["value"], "<p>hi</p>");
    }

    #[test]
    fn build_sender_requires_sendgrid_key() {
        let cfg = EmailConfig {
            provider: EmailProviderId::SendGrid,
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(build_sender(&cfg).is_err());
        assert!(build_sender(&EmailConfig::default()).is_ok());
    }
}
