//! Tracked Token
//!
//! Per-token drawdown state machine. A token starts with an all-time-high of
//! zero, raises it on every higher observation and fires exactly one alert
//! when the price falls `threshold_pct` or more below that high.

use chrono::{DateTime, Utc};

use super::elapsed::Elapsed;

/// Default drawdown threshold in percent
pub const DEFAULT_DRAWDOWN_THRESHOLD_PCT: f64 = 35.0;

/// Drop from `all_time_high` to `price` in percent
///
/// Returns `None` when there is no positive high to measure against.
pub fn drawdown_pct(all_time_high: f64, price: f64) -> Option<f64> {
    if all_time_high <= 0.0 || !all_time_high.is_finite() {
        return None;
    }
    Some((all_time_high - price) / all_time_high * 100.0)
}

/// Tracking state for one discovered mint
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedToken {
    pub mint: String,
    pub created_at: DateTime<Utc>,
    /// Signature of the feed entry that created the mint
    pub discovered_by: String,
    pub all_time_high: f64,
    pub alerted: bool,
    pub last_price: Option<f64>,
    pub last_liquidity_usd: Option<f64>,
    pub observations: u64,
}

/// Alert produced when a token crosses the drawdown threshold
#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownAlert {
    pub mint: String,
    pub drop_pct: f64,
    pub all_time_high: f64,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub alerted_at: DateTime<Utc>,
    pub elapsed: Elapsed,
}

/// Outcome of feeding one price into a token
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Alert already fired; nothing evaluated
    AlreadyAlerted,
    /// Price was negative or not finite; state unchanged
    Unusable,
    /// Price recorded, threshold not crossed
    Tracked {
        all_time_high: f64,
        drop_pct: Option<f64>,
        new_high: bool,
    },
    /// Threshold crossed; the token is now permanently alerted
    Alert(DrawdownAlert),
}

impl TrackedToken {
    pub fn new(mint: impl Into<String>, created_at: DateTime<Utc>, discovered_by: impl Into<String>) -> Self {
        Self {
            mint: mint.into(),
            created_at,
            discovered_by: discovered_by.into(),
            all_time_high: 0.0,
            alerted: false,
            last_price: None,
            last_liquidity_usd: None,
            observations: 0,
        }
    }

    /// Current drop from the all-time-high, if a last price is known
    pub fn current_drawdown_pct(&self) -> Option<f64> {
        self.last_price.and_then(|p| drawdown_pct(self.all_time_high, p))
    }

    /// Apply one price observation
    pub fn observe(
        &mut self,
        price: f64,
        liquidity_usd: Option<f64>,
        threshold_pct: f64,
        now: DateTime<Utc>,
    ) -> Observation {
        if self.alerted {
            return Observation::AlreadyAlerted;
        }
        if !price.is_finite() || price < 0.0 {
            return Observation::Unusable;
        }

        self.observations += 1;
        self.last_price = Some(price);
        if liquidity_usd.is_some() {
            self.last_liquidity_usd = liquidity_usd;
        }

        let new_high = price > self.all_time_high;
        if new_high {
            self.all_time_high = price;
        }

        let drop_pct = drawdown_pct(self.all_time_high, price);
        match drop_pct {
            Some(drop) if drop >= threshold_pct => {
                self.alerted = true;
                Observation::Alert(DrawdownAlert {
                    mint: self.mint.clone(),
                    drop_pct: drop,
                    all_time_high: self.all_time_high,
                    price,
                    created_at: self.created_at,
                    alerted_at: now,
                    elapsed: Elapsed::between(self.created_at, now),
                })
            }
            _ => Observation::Tracked {
                all_time_high: self.all_time_high,
                drop_pct,
                new_high,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn token() -> TrackedToken {
        TrackedToken::new("MintA", Utc::now() - Duration::seconds(3725), "sig1")
    }

    #[test]
    fn test_new_token_defaults() {
        let t = token();
        assert_eq!(t.all_time_high, 0.0);
        assert!(!t.alerted);
        assert_eq!(t.observations, 0);
        assert_eq!(t.current_drawdown_pct(), None);
    }

    #[test]
    fn test_drawdown_pct_zero_high() {
        assert_eq!(drawdown_pct(0.0, 1.0), None);
        assert_eq!(drawdown_pct(-1.0, 1.0), None);
        assert_relative_eq!(drawdown_pct(100.0, 64.0).unwrap(), 36.0);
    }

    #[test]
    fn test_alert_at_36_percent_drop() {
        let mut t = token();
        let now = Utc::now();

        assert!(matches!(
            t.observe(100.0, None, DEFAULT_DRAWDOWN_THRESHOLD_PCT, now),
            Observation::Tracked { new_high: true, .. }
        ));
        match t.observe(90.0, None, DEFAULT_DRAWDOWN_THRESHOLD_PCT, now) {
            Observation::Tracked { drop_pct, new_high, .. } => {
                assert!(!new_high);
                assert_relative_eq!(drop_pct.unwrap(), 10.0);
            }
            other => panic!("unexpected {:?}", other),
        }
        match t.observe(64.0, None, DEFAULT_DRAWDOWN_THRESHOLD_PCT, now) {
            Observation::Alert(alert) => {
                assert_relative_eq!(alert.drop_pct, 36.0);
                assert_eq!(alert.all_time_high, 100.0);
                assert_eq!(alert.price, 64.0);
                assert_eq!(alert.elapsed, Elapsed::between(t.created_at, now));
            }
            other => panic!("expected alert, got {:?}", other),
        }
        assert!(t.alerted);
    }

    #[test]
    fn test_exactly_at_threshold_alerts() {
        let mut t = token();
        let now = Utc::now();
        t.observe(100.0, None, 35.0, now);
        assert!(matches!(t.observe(65.0, None, 35.0, now), Observation::Alert(_)));
    }

    #[test]
    fn test_alert_fires_once() {
        let mut t = token();
        let now = Utc::now();
        t.observe(100.0, None, 35.0, now);
        assert!(matches!(t.observe(50.0, None, 35.0, now), Observation::Alert(_)));
        assert_eq!(t.observe(10.0, None, 35.0, now), Observation::AlreadyAlerted);
        assert_eq!(t.observe(1000.0, None, 35.0, now), Observation::AlreadyAlerted);
        assert_eq!(t.all_time_high, 100.0);
    }

    #[test]
    fn test_all_time_high_never_decreases() {
        let mut t = token();
        let now = Utc::now();
        let prices = [3.0, 1.0, 5.0, 4.9, 0.0, -2.0, f64::NAN, 7.5, 6.0, 7.4];
        let mut previous = t.all_time_high;
        for price in prices {
            t.observe(price, None, 101.0, now);
            assert!(t.all_time_high >= previous);
            previous = t.all_time_high;
        }
        assert_eq!(t.all_time_high, 7.5);
    }

    #[test]
    fn test_unusable_price_leaves_state() {
        let mut t = token();
        let before = t.clone();
        assert_eq!(t.observe(-0.5, Some(10.0), 35.0, Utc::now()), Observation::Unusable);
        assert_eq!(t.observe(f64::NAN, None, 35.0, Utc::now()), Observation::Unusable);
        assert_eq!(t.observe(f64::INFINITY, None, 35.0, Utc::now()), Observation::Unusable);
        assert_eq!(t, before);
    }

    #[test]
    fn test_price_to_zero_alerts_full_drop() {
        let mut t = token();
        let now = Utc::now();
        t.observe(100.0, None, 35.0, now);
        match t.observe(0.0, None, 35.0, now) {
            Observation::Alert(alert) => {
                assert_relative_eq!(alert.drop_pct, 100.0);
                assert_eq!(alert.all_time_high, 100.0);
                assert_eq!(alert.price, 0.0);
            }
            other => panic!("expected alert, got {:?}", other),
        }
        assert!(t.alerted);
        assert_eq!(t.observe(0.0, None, 35.0, now), Observation::AlreadyAlerted);
    }

    #[test]
    fn test_zero_price_on_fresh_token() {
        let mut t = token();
        match t.observe(0.0, None, 35.0, Utc::now()) {
            Observation::Tracked { all_time_high, drop_pct, new_high } => {
                assert_eq!(all_time_high, 0.0);
                assert_eq!(drop_pct, None);
                assert!(!new_high);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!t.alerted);
        assert_eq!(t.all_time_high, 0.0);
        assert_eq!(t.last_price, Some(0.0));
    }

    #[test]
    fn test_liquidity_recorded() {
        let mut t = token();
        t.observe(1.0, Some(5000.0), 35.0, Utc::now());
        t.observe(1.1, None, 35.0, Utc::now());
        assert_eq!(t.last_liquidity_usd, Some(5000.0));
        assert_eq!(t.observations, 2);
        assert_eq!(t.last_price, Some(1.1));
    }
}
