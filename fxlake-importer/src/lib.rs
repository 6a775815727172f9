//! Component D — Historical Importer.
//!
//! Pulls tick ranges from a [`provider::HistoricalProvider`] in adaptive
//! UTC-day chunks and writes them into the data lake using the same blob
//! layout `fxlake-data`'s tick batcher writes (component C).

pub mod chunk;
pub mod error;
pub mod http_provider;
pub mod importer;
pub mod provider;
pub mod symbols;

pub use error::ImportError;
pub use http_provider::HttpHistoricalProvider;
pub use importer::{import_range, ImportConfig, ImportSummary};
pub use provider::{HistoricalProvider, ProviderError, RawTick};
