//! Static fallback table of well-known ETFs.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Symbols suggested to users who don't know what to search for.
pub const POPULAR_ETFS: [&str; 10] = [
    "VTI", "VOO", "SPY", "QQQ", "ARKK", "VEA", "VWO", "AGG", "VNQ", "GLD",
];

const BUILTIN: [(&str, &str, &str, &str); 5] = [
    ("VTI", "Vanguard Total Stock Market ETF", "Vanguard", "Large Cap Equity"),
    ("VOO", "Vanguard S&P 500 ETF", "Vanguard", "Large Cap Equity"),
    ("SPY", "SPDR S&P 500 ETF Trust", "State Street", "Large Cap Equity"),
    ("QQQ", "Invesco QQQ Trust", "Invesco", "Technology"),
    ("ARKK", "ARK Innovation ETF", "ARK Invest", "Thematic"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownEtf {
    pub symbol: String,
    pub name: String,
    pub issuer: String,
    pub category: String,
}

/// Immutable symbol lookup, built once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct KnownEtfs {
    entries: BTreeMap<String, KnownEtf>,
}

impl KnownEtfs {
    /// The built-in table extended (or overridden) by `extra` rows.
    pub fn with_extra(extra: &[KnownEtf]) -> Self {
        let builtin = BUILTIN
            .iter()
            .map(|(symbol, name, issuer, category)| KnownEtf {
                symbol: symbol.to_string(),
                name: name.to_string(),
                issuer: issuer.to_string(),
                category: category.to_string(),
            });

        let entries = builtin
            .chain(extra.iter().cloned())
            .map(|mut etf| {
                etf.symbol = etf.symbol.trim().to_uppercase();
                (etf.symbol.clone(), etf)
            })
            .filter(|(symbol, _)| !symbol.is_empty())
            .collect();

        Self { entries }
    }

    pub fn builtin() -> Self {
        Self::with_extra(&[])
    }

    pub fn get(&self, symbol: &str) -> Option<&KnownEtf> {
        self.entries.get(&symbol.trim().to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup_is_case_insensitive() {
        let table = KnownEtfs::builtin();
        assert_eq!(table.len(), 5);
        assert_eq!(table.get("qqq").unwrap().issuer, "Invesco");
        assert!(table.get("VEA").is_none());
    }

    #[test]
    fn test_extra_rows_extend_and_override() {
        let table = KnownEtfs::with_extra(&[
            KnownEtf {
                symbol: "vea".to_string(),
                name: "Vanguard FTSE Developed Markets ETF".to_string(),
                issuer: "Vanguard".to_string(),
                category: "International Equity".to_string(),
            },
            KnownEtf {
                symbol: "QQQ".to_string(),
                name: "Invesco QQQ".to_string(),
                issuer: "Invesco".to_string(),
                category: "Large Cap Growth".to_string(),
            },
        ]);
        assert_eq!(table.len(), 6);
        assert_eq!(table.get("VEA").unwrap().category, "International Equity");
        assert_eq!(table.get("QQQ").unwrap().category, "Large Cap Growth");
    }
}
