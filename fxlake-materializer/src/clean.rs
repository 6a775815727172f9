//! Step 1-2 of candle construction: clean, then deduplicate by timestamp.

use fxlake_instrument::Tick;
use std::collections::HashMap;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanStats {
    pub total: usize,
    pub invalid: usize,
    pub duplicates: usize,
}

impl CleanStats {
    /// Invalid ticks over total, the figure the quality gate checks against
    /// the 5% threshold. Duplicates don't count against it.
    pub fn drop_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.invalid as f64 / self.total as f64
        }
    }
}

/// Drop ticks failing [`Tick::is_clean`] (non-finite/non-positive fields,
/// crossed spread), then dedupe the survivors by timestamp, keeping the
/// last occurrence at any given `t` (last-writer-wins).
pub fn clean_and_dedupe(ticks: &[Tick]) -> (Vec<Tick>, CleanStats) {
    let total = ticks.len();
    let mut invalid = 0usize;

    let mut by_timestamp: HashMap<u64, Tick> = HashMap::new();
    let mut order: Vec<u64> = Vec::new();

    for &tick in ticks {
        if !tick.is_clean() {
            invalid += 1;
            continue;
        }
        let key = tick.t.to_bits();
        if !by_timestamp.contains_key(&key) {
            order.push(key);
        }
        by_timestamp.insert(key, tick);
    }

    let duplicates = (total - invalid).saturating_sub(order.len());
    let cleaned = order.into_iter().map(|key| by_timestamp[&key]).collect();

    (cleaned, CleanStats {
        total,
        invalid,
        duplicates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossed_spread_and_non_finite_ticks_are_dropped() {
        let ticks = vec![
            Tick::new(1.0, 1.1, 1.2),
            Tick::new(2.0, 1.3, 1.1), // crossed spread
            Tick::new(3.0, f64::NAN, 1.1),
        ];
        let (cleaned, stats) = clean_and_dedupe(&ticks);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(stats.invalid, 2);
        assert_eq!(stats.total, 3);
    }

    #[test]
    fn duplicate_timestamp_keeps_last_occurrence() {
        let ticks = vec![Tick::new(100.0, 1.0, 2.0), Tick::new(100.0, 3.0, 4.0)];
        let (cleaned, stats) = clean_and_dedupe(&ticks);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].mid(), 3.5);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.invalid, 0);
    }

    #[test]
    fn empty_input_has_zero_drop_rate() {
        let (cleaned, stats) = clean_and_dedupe(&[]);
        assert!(cleaned.is_empty());
        assert_eq!(stats.drop_rate(), 0.0);
    }
}
