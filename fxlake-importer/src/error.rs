use thiserror::Error;

/// Error taxonomy for the historical importer. Every other failure mode
/// (`ProviderBuffer`, transient network errors, generic provider errors,
/// object-store write failures) is absorbed internally — logged and
/// skipped or retried — so it never reaches this type. Only a symbol that
/// isn't on the supported-instrument allowlist is fatal at job scope —
/// exit non-zero.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("symbol {0} is not a supported instrument")]
    InvalidSymbol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_symbol_error_names_the_rejected_symbol() {
        let error = ImportError::InvalidSymbol("XXXYYY".into());
        assert!(error.to_string().contains("XXXYYY"));
    }
}
