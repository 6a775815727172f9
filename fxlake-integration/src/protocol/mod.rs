//! Transport adapters. One module per wire shape a [`Broker
//! Session`](https://docs.rs/fxlake-data) variant can speak.

pub mod http_stream;
pub mod websocket;
