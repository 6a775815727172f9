//! Allowlist of instruments the historical provider is known to serve.
//! A symbol outside this list fails fast with `InvalidSymbol` rather than
//! being handed to the provider and failing downstream; the provider's
//! own SDK only covers major/cross FX pairs, so this mirrors that scope.

use crate::error::ImportError;
use fxlake_instrument::Symbol;

pub const SUPPORTED_SYMBOLS: &[&str] = &[
    "EURUSD", "GBPUSD", "USDJPY", "AUDUSD", "USDCHF", "USDCAD", "NZDUSD", "EURGBP", "EURJPY",
    "GBPJPY", "EURCHF", "EURAUD", "GBPCHF",
];

pub fn validate(symbol: &Symbol) -> Result<(), ImportError> {
    if SUPPORTED_SYMBOLS.contains(&symbol.as_str()) {
        Ok(())
    } else {
        Err(ImportError::InvalidSymbol(symbol.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eurusd_is_supported() {
        assert!(validate(&Symbol::canonicalize("EURUSD")).is_ok());
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let error = validate(&Symbol::canonicalize("ZZZQQQ")).unwrap_err();
        assert!(matches!(error, ImportError::InvalidSymbol(_)));
    }
}
