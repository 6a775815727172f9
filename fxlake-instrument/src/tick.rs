use serde::{Deserialize, Serialize};

/// One `(t, bid, ask)` price observation.
///
/// `t` is Unix time in seconds, sub-second precision allowed. Ticks are
/// immutable once constructed — there is no mutation API, only
/// construction and validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub t: f64,
    pub bid: f64,
    pub ask: f64,
}

/// Sane wall-clock bounds for a tick timestamp, expressed as Unix seconds:
/// 2020-01-01T00:00:00Z and 2030-01-01T00:00:00Z respectively.
pub const MIN_VALID_TIMESTAMP: f64 = 1_577_836_800.0;
pub const MAX_VALID_TIMESTAMP: f64 = 1_893_456_000.0;

impl Tick {
    pub fn new(t: f64, bid: f64, ask: f64) -> Self {
        Self { t, bid, ask }
    }

    /// Mid-price, `(bid + ask) / 2`.
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// Mid-price rounded to 5 decimal places, the precision candles are
    /// built from.
    pub fn rounded_mid(&self) -> f64 {
        round5(self.mid())
    }

    /// UTC calendar day the tick falls in, as a Unix-seconds midnight.
    pub fn utc_day_start(&self) -> i64 {
        (self.t as i64).div_euclid(86_400) * 86_400
    }

    /// `t`, `bid`, `ask` all finite, with `t` and `bid`/`ask` strictly
    /// positive. Shared by ingest-time and historical-import sanitization;
    /// neither checks `bid < ask` or a clock range — those are narrower
    /// checks layered on top where they apply.
    pub fn has_finite_positive_fields(&self) -> bool {
        self.t.is_finite()
            && self.t > 0.0
            && self.bid.is_finite()
            && self.bid > 0.0
            && self.ask.is_finite()
            && self.ask > 0.0
    }

    /// Ingest-time validation: everything `has_finite_positive_fields`
    /// requires, plus `t` within the sane clock range. Does **not** check
    /// `bid < ask` — spread validity is a cleaning-stage concern, not an
    /// ingest-time rejection; ingest has no opinion on spread validity.
    pub fn is_batchable(&self) -> bool {
        self.has_finite_positive_fields()
            && (MIN_VALID_TIMESTAMP..=MAX_VALID_TIMESTAMP).contains(&self.t)
    }

    /// Cleaning-stage validity: everything `is_batchable` requires, minus
    /// the clock-range check, plus a non-crossed spread (`bid < ask`).
    pub fn is_clean(&self) -> bool {
        self.has_finite_positive_fields() && self.bid < self.ask
    }
}

/// Round a price-like value to 5 decimal places.
pub fn round5(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}
