//! One module per CLI subcommand. Each `run` function owns its
//! own config loading and connection setup — there is no shared global
//! client.

pub mod analyze;
pub mod backfill;
pub mod dates;
pub mod error;
pub mod import;
pub mod materialize;

pub use error::CliError;
