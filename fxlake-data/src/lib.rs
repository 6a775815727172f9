//! Components A, B, C — Broker Session, Broker Router, Tick Batcher.
//!
//! This crate owns every long-lived live-data worker: one task per
//! [`session::BrokerSession`], the [`router::BrokerRouter`] that owns them,
//! and the [`batcher`] worker that accumulates ticks into blobs for the
//! data lake. Nothing here knows about historical backfill or candles —
//! that's `fxlake-importer` and `fxlake-materializer`.

pub mod batcher;
pub mod config;
pub mod error;
pub mod reconnect;
pub mod router;
pub mod session;
pub mod store;

pub use batcher::TickBatcherHandle;
pub use error::SessionError;
pub use router::BrokerRouter;
pub use session::{BrokerSession, TickEvent};
