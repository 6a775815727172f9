use serde::{Deserialize, Deserializer, Serialize};
use smol_str::SmolStr;
use std::fmt::{Display, Formatter};

/// Canonical uppercase instrument identifier with no separators, e.g.
/// `EURUSD`.
///
/// Each [`BrokerSession`](https://docs.rs/fxlake-data) variant speaks its
/// own upstream wire form (`EUR/USD`, `eurusd`, `EUR-USD`, ...);
/// canonicalization into and back out of this type is that session's
/// responsibility.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct Symbol(SmolStr);

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(|raw| Symbol::canonicalize(&raw))
    }
}

impl Symbol {
    /// Canonicalize an upstream-specific symbol form into the slashless,
    /// uppercase canonical form: no separators, only uppercase letters.
    ///
    /// Idempotent: `canonicalize(canonicalize(x)) == canonicalize(x)`.
    pub fn canonicalize(raw: &str) -> Self {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Self(SmolStr::new(cleaned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_canonical(&self) -> bool {
        !self.0.is_empty() && self.0.chars().all(|c| c.is_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_strips_separators_and_uppercases() {
        assert_eq!(Symbol::canonicalize("eur/usd").as_str(), "EURUSD");
        assert_eq!(Symbol::canonicalize("EUR-USD").as_str(), "EURUSD");
        assert_eq!(Symbol::canonicalize("eurusd").as_str(), "EURUSD");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let once = Symbol::canonicalize("eur/usd");
        let twice = Symbol::canonicalize(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn canonical_form_has_no_separators() {
        let symbol = Symbol::canonicalize("BTC_USDT-PERP");
        assert!(symbol.is_canonical());
        assert!(!symbol.as_str().contains(['_', '-', '/']));
    }
}
