mod queue;
mod sender;
mod templates;

use async_trait::async_trait;
use thiserror::Error;

pub use queue::{EmailQueue, RetryPolicy, deliver_with_retry};
pub use sender::{LogEmailSender, SendGridEmailSender, build_sender};
pub use templates::{PasswordResetEmail, reset_link};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("email template failed to render: {0}")]
    Template(#[from] askama::Error),
    #[error("email queue is closed")]
    QueueClosed,
    #[error("email queue is full")]
    QueueFull,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}
