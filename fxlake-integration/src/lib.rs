//! Transport, error, and channel primitives shared by every `fxlake` crate.
//!
//! Nothing here knows about ticks, candles, or venues — it is the bottom
//! plumbing layer every other crate in the workspace builds on.

pub mod channel;
pub mod error;
pub mod protocol;

pub use error::SocketError;
