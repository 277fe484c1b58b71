use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::adapters::http::DEFAULT_REQUEST_TIMEOUT;
use crate::ports::{MessageFormat, Notifier, NotifyError};

use super::types::{ApiResponse, SendMessageRequest, Update};

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: String,
    pub timeout: Duration,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            bot_token: bot_token.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Telegram Bot API client
///
/// The bot token is part of every request path and is never logged.
#[derive(Clone)]
pub struct TelegramNotifier {
    config: TelegramConfig,
    http: Client,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_url", &self.config.api_url)
            .finish_non_exhaustive()
    }
}

fn parse_mode(format: MessageFormat) -> Option<&'static str> {
    match format {
        MessageFormat::Plain => None,
        MessageFormat::Html => Some("HTML"),
    }
}

fn network_error(err: reqwest::Error) -> NotifyError {
    // reqwest includes the URL, and with it the token, in its Display output
    NotifyError::Network(err.without_url().to_string())
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        if config.bot_token.is_empty() {
            return Err(NotifyError::NotConfigured("telegram bot token is empty".to_string()));
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(network_error)?;
        Ok(Self { config, http })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Option<T>, NotifyError> {
        let status = response.status();
        let body = response.text().await.map_err(network_error)?;

        let envelope: Option<ApiResponse<T>> = serde_json::from_str(&body).ok();
        match envelope {
            Some(env) if status.is_success() && env.ok => Ok(env.result),
            Some(env) => Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: env.description.unwrap_or(body),
            }),
            None => Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            }),
        }
    }

    /// Fetch pending updates after `offset`, long-polling up to `poll`
    pub async fn get_updates(&self, offset: Option<i64>, poll: Duration) -> Result<Vec<Update>, NotifyError> {
        let mut query = vec![
            ("timeout", poll.as_secs().to_string()),
            ("allowed_updates", r#"["message"]"#.to_string()),
        ];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let response = self
            .http
            .get(self.method_url("getUpdates"))
            .query(&query)
            .timeout(poll + self.config.timeout)
            .send()
            .await
            .map_err(network_error)?;

        Ok(Self::read_envelope::<Vec<Update>>(response).await?.unwrap_or_default())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, destination: &str, text: &str, format: MessageFormat) -> Result<(), NotifyError> {
        if destination.is_empty() {
            return Err(NotifyError::NotConfigured("telegram chat id is empty".to_string()));
        }

        let payload = SendMessageRequest {
            chat_id: destination,
            text,
            parse_mode: parse_mode(format),
            disable_web_page_preview: true,
        };

        let response = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await
            .map_err(network_error)?;

        Self::read_envelope::<serde_json::Value>(response).await?;
        debug!(chat_id = %destination, "Telegram message delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_rejected() {
        let err = TelegramNotifier::new(TelegramConfig::new("")).unwrap_err();
        assert!(matches!(err, NotifyError::NotConfigured(_)));
    }

    #[test]
    fn test_method_url() {
        let mut config = TelegramConfig::new("123:abc");
        config.api_url = "https://api.telegram.org/".to_string();
        let notifier = TelegramNotifier::new(config).unwrap();
        assert_eq!(
            notifier.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let notifier = TelegramNotifier::new(TelegramConfig::new("123:secret")).unwrap();
        assert!(!format!("{:?}", notifier).contains("secret"));
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode(MessageFormat::Html), Some("HTML"));
        assert_eq!(parse_mode(MessageFormat::Plain), None);
    }

    #[tokio::test]
    async fn test_empty_destination_rejected() {
        let notifier = TelegramNotifier::new(TelegramConfig::new("123:abc")).unwrap();
        let err = notifier.send("", "hi", MessageFormat::Plain).await.unwrap_err();
        assert!(matches!(err, NotifyError::NotConfigured(_)));
    }
}
