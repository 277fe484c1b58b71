//! Notifier Port

use async_trait::async_trait;

use super::models::NotifyError;

/// Formatting applied by the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageFormat {
    #[default]
    Plain,
    /// Telegram-style HTML subset (`<b>`, `<code>`)
    Html,
}

/// Text delivery channel
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to `destination`
    async fn send(
        &self,
        destination: &str,
        text: &str,
        format: MessageFormat,
    ) -> Result<(), NotifyError>;
}
