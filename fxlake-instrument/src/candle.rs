use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};

/// Width in seconds of the sole materialized timeframe. Higher timeframes
/// (15m/1h/4h/12h) are continuous aggregates maintained by the relational
/// store itself, not constructed here.
pub const BUCKET_SECONDS: i64 = 300;

/// A single OHLC record over one 5-minute bucket for one symbol.
///
/// `volume` is always zero — the tick source carries no traded size, only
/// bid/ask quotes. Candles are a pure, deterministic function of their
/// input tick set: two runs over the same ticks always produce
/// byte-identical candles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub bucket_start: i64,
    pub symbol: Symbol,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trades: u32,
}

/// Floor a Unix-second timestamp down to its containing bucket start.
pub fn bucket_start(t: f64) -> i64 {
    (t as i64).div_euclid(BUCKET_SECONDS) * BUCKET_SECONDS
}

impl Candle {
    /// `low <= min(open, close) <= max(open, close) <= high`. Also requires
    /// at least one trade and every field finite.
    pub fn is_valid(&self) -> bool {
        self.trades >= 1
            && [self.open, self.high, self.low, self.close, self.volume]
                .iter()
                .all(|v| v.is_finite())
            && !self.symbol.as_str().is_empty()
            && self.low <= self.open.min(self.close)
            && self.open.max(self.close) <= self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64, trades: u32) -> Candle {
        Candle {
            bucket_start: 0,
            symbol: Symbol::canonicalize("EURUSD"),
            open,
            high,
            low,
            close,
            volume: 0.0,
            trades,
        }
    }

    #[test]
    fn single_tick_bucket_has_open_eq_high_eq_low_eq_close() {
        let c = candle(1.1001, 1.1001, 1.1001, 1.1001, 1);
        assert!(c.is_valid());
    }

    #[test]
    fn bucket_start_floors_to_five_minutes() {
        assert_eq!(bucket_start(1_704_067_200.0), 1_704_067_200);
        assert_eq!(bucket_start(1_704_067_499.0), 1_704_067_200);
        assert_eq!(bucket_start(1_704_067_500.0), 1_704_067_500);
    }

    #[test]
    fn inverted_high_low_is_invalid() {
        let c = candle(1.1, 1.0, 1.2, 1.1, 3);
        assert!(!c.is_valid());
    }

    #[test]
    fn zero_trades_is_invalid() {
        let c = candle(1.1, 1.2, 1.0, 1.15, 0);
        assert!(!c.is_valid());
    }
}
