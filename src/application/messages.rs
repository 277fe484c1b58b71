//! Notification texts and delivery
//!
//! Messages use the Telegram HTML subset. Delivery failures are logged and
//! swallowed: a discovery or alert that already happened is never undone
//! because the channel was down.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::DrawdownAlert;
use crate::ports::{MessageFormat, Notifier};

/// Render a USD price with enough precision for sub-cent meme tokens
pub fn format_price(price: f64) -> String {
    if price >= 1.0 {
        format!("${:.4}", price)
    } else if price >= 0.01 {
        format!("${:.6}", price)
    } else {
        format!("${:.10}", price)
    }
}

pub fn token_discovered(mint: &str, created_at: DateTime<Utc>) -> String {
    format!(
        "🆕 <b>New token created</b>\n\
         Mint: <code>{}</code>\n\
         Created: {}",
        mint,
        created_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

pub fn drawdown_alert(alert: &DrawdownAlert) -> String {
    format!(
        "⚠️ <b>Token dropped {:.2}% from its ATH</b>\n\
         Mint: <code>{}</code>\n\
         ATH: {}\n\
         Price: {}\n\
         ⏱ Time since creation: {}",
        alert.drop_pct,
        alert.mint,
        format_price(alert.all_time_high),
        format_price(alert.price),
        alert.elapsed
    )
}

pub fn watcher_started(wallet: &str, threshold_pct: f64) -> String {
    format!(
        "🤖 <b>Watcher active</b>\n\
         Wallet: <code>{}</code>\n\
         Drawdown alert at: {:.1}%",
        wallet, threshold_pct
    )
}

/// Notifier bound to its destination
#[derive(Clone)]
pub struct AlertSink {
    notifier: Arc<dyn Notifier>,
    destination: String,
}

impl AlertSink {
    pub fn new(notifier: Arc<dyn Notifier>, destination: impl Into<String>) -> Self {
        Self {
            notifier,
            destination: destination.into(),
        }
    }

    /// Send an HTML message; returns whether delivery succeeded
    pub async fn deliver(&self, text: &str) -> bool {
        match self
            .notifier
            .send(&self.destination, text, MessageFormat::Html)
            .await
        {
            Ok(()) => {
                debug!(destination = %self.destination, "Notification delivered");
                true
            }
            Err(e) => {
                warn!(destination = %self.destination, error = %e, "Notification failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Elapsed;
    use crate::ports::mocks::RecordingNotifier;

    #[test]
    fn test_format_price_precision() {
        assert_eq!(format_price(12.5), "$12.5000");
        assert_eq!(format_price(0.05), "$0.050000");
        assert_eq!(format_price(0.0000123), "$0.0000123000");
    }

    #[test]
    fn test_drawdown_alert_text() {
        let now = Utc::now();
        let alert = DrawdownAlert {
            mint: "MintA".to_string(),
            drop_pct: 36.0,
            all_time_high: 100.0,
            price: 64.0,
            created_at: now,
            alerted_at: now,
            elapsed: Elapsed::from_seconds(3725),
        };
        let text = drawdown_alert(&alert);
        assert!(text.contains("36.00%"));
        assert!(text.contains("<code>MintA</code>"));
        assert!(text.contains("1h 2m 5s"));
    }

    #[test]
    fn test_token_discovered_text() {
        let created = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let text = token_discovered("MintB", created);
        assert!(text.contains("MintB"));
        assert!(text.contains("2023-11-14 22:13:20 UTC"));
    }

    #[tokio::test]
    async fn test_sink_reports_failure() {
        let ok = AlertSink::new(Arc::new(RecordingNotifier::new()), "chat");
        assert!(ok.deliver("hi").await);

        let down = AlertSink::new(Arc::new(RecordingNotifier::new().failing()), "chat");
        assert!(!down.deliver("hi").await);
    }
}
