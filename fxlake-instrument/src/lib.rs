//! Core data model shared by every `fxlake` component: [`Symbol`], [`Tick`],
//! [`Candle`] and [`VenueId`].

pub mod candle;
pub mod datemath;
pub mod symbol;
pub mod tick;
pub mod venue;

pub use candle::Candle;
pub use symbol::Symbol;
pub use tick::Tick;
pub use venue::VenueId;
