//! Component E — candle construction, relational upsert, and coverage
//! analysis.
//!
//! [`candles::build_candles`] is the pure, deterministic construction
//! pipeline; [`store::CandleStore`] is the only piece that talks to
//! Postgres; [`pipeline`] wires blob reading and the two together for one
//! UTC day at a time.

pub mod candles;
pub mod clean;
pub mod coverage;
pub mod error;
pub mod pipeline;
pub mod store;

pub use candles::build_candles;
pub use clean::{clean_and_dedupe, CleanStats};
pub use coverage::{build_coverage, CoverageReport};
pub use error::MaterializeError;
pub use pipeline::{
    bucket_statistics, load_ticks_for_day, materialize_day, BucketStatistics, LoadedTicks,
    MaterializeSummary,
};
pub use store::CandleStore;
