use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};

use super::{EmailError, EmailMessage, EmailSender};
use crate::config::EmailConfig;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before attempt `n + 1` is `n * base_delay`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(cfg: &EmailConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.retry_delay_ms),
        }
    }
}

/// Sends `message`, retrying failures up to `policy.max_attempts` times in
/// total. Returns the attempt number that succeeded.
pub async fn deliver_with_retry(
    sender: &dyn EmailSender,
    message: &EmailMessage,
    policy: RetryPolicy,
) -> Result<u32, EmailError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match sender.send(message).await {
            Ok(()) => return Ok(attempt),
            Err(err) if attempt < max_attempts => {
                tracing::warn!(
                    to = %message.to,
                    attempt,
                    max_attempts,
                    error = %err,
                    "email delivery failed, retrying"
                );
                tokio::time::sleep(policy.base_delay * attempt).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Handle to the background delivery worker. Cloning shares the same worker.
#[derive(Clone)]
pub struct EmailQueue {
    tx: mpsc::Sender<EmailMessage>,
}

impl EmailQueue {
    /// Starts the worker. It exits once every queue handle is dropped.
    pub fn spawn(
        sender: Arc<dyn EmailSender>,
        policy: RetryPolicy,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<EmailMessage>(capacity.max(1));
        let worker = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match deliver_with_retry(sender.as_ref(), &message, policy).await {
                    Ok(attempt) => {
                        tracing::info!(to = %message.to, subject = %message.subject, attempt, "email delivered")
                    }
                    Err(err) => tracing::error!(
                        to = %message.to,
                        subject = %message.subject,
                        error = %err,
                        "email delivery gave up"
                    ),
                }
            }
            tracing::debug!("email worker stopped");
        });
        (Self { tx }, worker)
    }

    /// Queues without waiting; fails fast when the worker is saturated.
    pub fn enqueue(&self, message: EmailMessage) -> Result<(), EmailError> {
        self.tx.try_send(message).map_err(|err| match err {
            TrySendError::Full(_) => EmailError::QueueFull,
            TrySendError::Closed(_) => EmailError::QueueClosed,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU32, Ordering},
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::{EmailQueue, RetryPolicy, deliver_with_retry};
    use crate::mail::{EmailError, EmailMessage, EmailSender};

    struct FlakySender {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl EmailSender for FlakySender {
        async fn send(&self, _message: &EmailMessage) -> Result<(), EmailError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures_before_success {
                return Err(EmailError::Rejected {
                    status: 503,
                    body: "try later".to_string(),
                });
            }
            Ok(())
        }
    }

    struct ChannelSender(mpsc::UnboundedSender<EmailMessage>);

    #[async_trait]
    impl EmailSender for ChannelSender {
        async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
            let _ = self.0.send(message.clone());
            Ok(())
        }
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to: "alice@example.com".to_string(),
            subject: "Reset".to_string(),
            html: "<p>reset</p>".to_string(),
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let sender = FlakySender {
            failures_before_success: 2,
            calls: AtomicU32::new(0),
        };

        let attempt = deliver_with_retry(&sender, &message(), policy(3))
            .await
            .expect("third attempt should succeed");
        assert_eq!(attempt, 3);
        assert_eq!(sender.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let sender = FlakySender {
            failures_before_success: u32::MAX,
            calls: AtomicU32::new(0),
        };

        let err = deliver_with_retry(&sender, &message(), policy(3))
            .await
            .expect_err("delivery should fail");
        assert!(matches!(err, EmailError::Rejected { status: 503, .. }));
        assert_eq!(sender.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn worker_delivers_queued_messages() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (queue, _worker) = EmailQueue::spawn(Arc::new(ChannelSender(tx)), policy(1), 4);

        queue.enqueue(message()).expect("enqueue should succeed");

        let delivered = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("worker should deliver in time")
            .expect("message should arrive");
        assert_eq!(delivered, message());
    }

    #[tokio::test]
    async fn enqueue_fails_when_worker_is_gone() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let (queue, worker) = EmailQueue::spawn(Arc::new(ChannelSender(tx)), policy(1), 1);
        worker.abort();
        let _ = worker.await;

        let err = queue.enqueue(message()).expect_err("queue should be closed");
        assert!(matches!(err, EmailError::QueueClosed));
    }
}
