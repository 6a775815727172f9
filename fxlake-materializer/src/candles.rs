//! Component E.1 — deterministic, streaming, O(n) candle construction from
//! an unordered tick set for one symbol covering one day.

use crate::clean::{clean_and_dedupe, CleanStats};
use crate::error::MaterializeError;
use fxlake_instrument::candle::bucket_start;
use fxlake_instrument::{Candle, Symbol, Tick};

/// Above this invalid-tick drop rate, candle construction aborts rather
/// than building candles from a suspect tick set.
pub const QUALITY_GATE_MAX_DROP_RATE: f64 = 0.05;

/// Run the full construction pipeline: clean, quality-gate, dedupe, sort,
/// bucket, emit. Returns the ordered candle sequence plus the cleaning
/// statistics the caller may want to log.
///
/// Pure function of its input: two calls over the same tick set always
/// produce byte-identical output.
pub fn build_candles(
    symbol: &Symbol,
    ticks: &[Tick],
) -> Result<(Vec<Candle>, CleanStats), MaterializeError> {
    let (mut cleaned, stats) = clean_and_dedupe(ticks);

    if stats.total > 0 && stats.drop_rate() > QUALITY_GATE_MAX_DROP_RATE {
        return Err(MaterializeError::Quality {
            drop_rate: stats.drop_rate(),
            invalid: stats.invalid,
            total: stats.total,
        });
    }

    cleaned.sort_by(|a, b| a.t.total_cmp(&b.t));

    Ok((bucket_into_candles(symbol, &cleaned), stats))
}

/// Step 5-6: bucket sorted, cleaned ticks into 5-minute candles and emit
/// them in bucket order. A bucket with one tick has `open == high == low
/// == close`.
fn bucket_into_candles(symbol: &Symbol, sorted_ticks: &[Tick]) -> Vec<Candle> {
    let mut candles = Vec::new();
    let mut current: Option<(i64, f64, f64, f64, f64, u32)> = None; // (bucket, open, high, low, close, trades)

    for tick in sorted_ticks {
        let bucket = bucket_start(tick.t);
        let mid = tick.rounded_mid();

        match &mut current {
            Some((b, _, high, low, close, trades)) if *b == bucket => {
                *high = high.max(mid);
                *low = low.min(mid);
                *close = mid;
                *trades += 1;
            }
            _ => {
                if let Some((b, open, high, low, close, trades)) = current.take() {
                    candles.push(make_candle(symbol, b, open, high, low, close, trades));
                }
                current = Some((bucket, mid, mid, mid, mid, 1));
            }
        }
    }

    if let Some((b, open, high, low, close, trades)) = current {
        candles.push(make_candle(symbol, b, open, high, low, close, trades));
    }

    candles
}

#[allow(clippy::too_many_arguments)]
fn make_candle(
    symbol: &Symbol,
    bucket_start: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    trades: u32,
) -> Candle {
    Candle {
        bucket_start,
        symbol: symbol.clone(),
        open,
        high,
        low,
        close,
        volume: 0.0,
        trades,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eurusd() -> Symbol {
        Symbol::canonicalize("EURUSD")
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let (candles, stats) = build_candles(&eurusd(), &[]).unwrap();
        assert!(candles.is_empty());
        assert_eq!(stats.total, 0);
    }

    #[test]
    fn single_bucket_candle_matches_spec_scenario_1() {
        let ticks = vec![
            Tick::new(1_704_067_200.0, 1.1000, 1.1002),
            Tick::new(1_704_067_260.0, 1.1004, 1.1006),
            Tick::new(1_704_067_499.0, 1.1001, 1.1003),
        ];
        let (candles, stats) = build_candles(&eurusd(), &ticks).unwrap();
        assert_eq!(candles.len(), 1);
        let candle = &candles[0];
        assert_eq!(candle.bucket_start, 1_704_067_200);
        assert_eq!(candle.open, 1.1001);
        assert_eq!(candle.high, 1.1005);
        assert_eq!(candle.low, 1.1001);
        assert_eq!(candle.close, 1.1002);
        assert_eq!(candle.trades, 3);
        assert_eq!(candle.volume, 0.0);
        assert_eq!(stats.invalid, 0);
    }

    #[test]
    fn dedup_by_timestamp_keeps_last_writer_mid() {
        let t = 1_704_067_200.0;
        let ticks = vec![Tick::new(t, 1.0, 2.0), Tick::new(t, 3.0, 4.0)];
        let (candles, _) = build_candles(&eurusd(), &ticks).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open, 3.5);
        assert_eq!(candles[0].close, 3.5);
    }

    #[test]
    fn single_tick_bucket_has_equal_ohlc() {
        let ticks = vec![Tick::new(1_704_067_200.0, 1.1000, 1.1002)];
        let (candles, _) = build_candles(&eurusd(), &ticks).unwrap();
        let candle = &candles[0];
        assert_eq!(candle.open, candle.high);
        assert_eq!(candle.high, candle.low);
        assert_eq!(candle.low, candle.close);
        assert_eq!(candle.trades, 1);
    }

    #[test]
    fn drop_rate_over_five_percent_aborts_with_quality_error() {
        let mut ticks: Vec<Tick> = (0..940)
            .map(|i| Tick::new(1_704_067_200.0 + i as f64, 1.1, 1.1002))
            .collect();
        ticks.extend((0..60).map(|i| Tick::new(1_704_067_200.0 + 940.0 + i as f64, 1.2, 1.1))); // crossed spread
        let error = build_candles(&eurusd(), &ticks).unwrap_err();
        assert!(matches!(error, MaterializeError::Quality { .. }));
    }

    #[test]
    fn out_of_order_ticks_sort_before_bucketing() {
        let ticks = vec![
            Tick::new(1_704_067_260.0, 1.1004, 1.1006),
            Tick::new(1_704_067_200.0, 1.1000, 1.1002),
        ];
        let (candles, _) = build_candles(&eurusd(), &ticks).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open, 1.1001);
        assert_eq!(candles[0].close, 1.1005);
    }

    #[test]
    fn construction_is_a_pure_function_of_its_input() {
        let ticks = vec![
            Tick::new(1_704_067_200.0, 1.1000, 1.1002),
            Tick::new(1_704_067_500.0, 1.1010, 1.1012),
        ];
        let (first, _) = build_candles(&eurusd(), &ticks).unwrap();
        let (second, _) = build_candles(&eurusd(), &ticks).unwrap();
        assert_eq!(first, second);
    }
}
