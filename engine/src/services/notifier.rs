// Outbound delivery of the combined signal message, with bounded fixed-delay retries.
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::EngineError;

/// Abstract interface for a messaging channel.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered { attempts: u32 },
    Exhausted { attempts: u32 },
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered { .. })
    }
}

pub struct Notifier {
    sender: Arc<dyn MessageSender>,
    chat_id: String,
    retries: u32,
    retry_delay: Duration,
}

impl Notifier {
    pub fn new(sender: Arc<dyn MessageSender>, chat_id: impl Into<String>, retries: u32, retry_delay: Duration) -> Self {
        Notifier {
            sender,
            chat_id: chat_id.into(),
            retries,
            retry_delay,
        }
    }

    /// Never fails: an undeliverable message is logged and reported as `Exhausted`.
    pub async fn send(&self, message: &str) -> Delivery {
        tracing::info!(chars = message.chars().count(), "Attempting to send signal");
        for attempt in 1..=self.retries {
            match self.sender.send_message(&self.chat_id, message).await {
                Ok(()) => {
                    tracing::info!(attempt, "Signal sent successfully");
                    return Delivery::Delivered { attempts: attempt };
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "Error sending message");
                    if attempt < self.retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        tracing::error!(attempts = self.retries, "Failed to deliver signal after all retries");
        Delivery::Exhausted { attempts: self.retries }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tracing_test::traced_test;

    /// Fails the first `failures` calls, then records every delivered message.
    pub(crate) struct FlakySender {
        failures: usize,
        pub(crate) calls: AtomicUsize,
        pub(crate) delivered: Mutex<Vec<String>>,
    }

    impl FlakySender {
        pub(crate) fn new(failures: usize) -> Self {
            FlakySender {
                failures,
                calls: AtomicUsize::new(0),
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MessageSender for FlakySender {
        async fn send_message(&self, _chat_id: &str, text: &str) -> Result<(), EngineError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(EngineError::NotificationError(format!("network down (call {})", call + 1)));
            }
            self.delivered.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_delivers_on_third_attempt() {
        let sender = Arc::new(FlakySender::new(2));
        let notifier = Notifier::new(sender.clone(), "chat", 3, Duration::from_secs(5));
        let started = tokio::time::Instant::now();

        let delivery = notifier.send("hello").await;

        assert_eq!(delivery, Delivery::Delivered { attempts: 3 });
        assert_eq!(sender.calls.load(Ordering::SeqCst), 3);
        assert_eq!(*sender.delivered.lock().unwrap(), vec!["hello".to_string()]);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        logs_assert(|lines: &[&str]| {
            let failures: Vec<&&str> = lines.iter().filter(|l| l.contains("Error sending message")).collect();
            match failures.as_slice() {
                [first, second] if first.contains("attempt=1") && second.contains("attempt=2") => Ok(()),
                other => Err(format!("expected failures on attempts 1 and 2, got {:?}", other)),
            }
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_without_panicking() {
        let sender = Arc::new(FlakySender::new(usize::MAX));
        let notifier = Notifier::new(sender.clone(), "chat", 3, Duration::from_secs(5));

        let delivery = notifier.send("hello").await;

        assert_eq!(delivery, Delivery::Exhausted { attempts: 3 });
        assert!(!delivery.is_delivered());
        assert_eq!(sender.calls.load(Ordering::SeqCst), 3);
        assert!(sender.delivered.lock().unwrap().is_empty());
    }
}
