//! Notifier that writes messages to the log instead of a chat

use async_trait::async_trait;
use tracing::info;

use crate::ports::{MessageFormat, Notifier, NotifyError};

/// Dry-run notifier
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, destination: &str, text: &str, format: MessageFormat) -> Result<(), NotifyError> {
        info!(destination = %destination, format = ?format, "[dry-run] {}", text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_delivers() {
        let notifier = LogNotifier::new();
        assert!(notifier.send("", "<b>hello</b>", MessageFormat::Html).await.is_ok());
    }
}
