use crate::config::ConfigError;
use thiserror::Error;

/// Top-level CLI error. Every variant here is fatal at job scope:
/// reaching `main` means the job could not even get set up or hit an
/// invariant violation, not a recoverable per-tick/per-chunk condition —
/// those never leave `fxlake-data`/`fxlake-importer`/`fxlake-materializer`.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} day(s) in range failed the quality gate")]
    QualityGateFailures(u32),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Import(#[from] fxlake_importer::ImportError),

    #[error(transparent)]
    Materialize(#[from] fxlake_materializer::MaterializeError),

    #[error(transparent)]
    ObjectStore(#[from] object_store::Error),

    #[error("failed to write output file {path}: {source}")]
    OutputWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
