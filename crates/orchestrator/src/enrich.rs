use crate::reference::ReferenceData;

/// Sector, industry, and ETF membership for one ticker. Unknown fields
/// default to `"Unknown"` (sector/industry) or empty (etfs).
pub struct Enrichment {
    pub sector: String,
    pub industry: String,
    pub etfs: String,
    pub etfs_pretty: String,
}

/// Left-join sector/industry/ETF-membership onto a ticker. If the ticker is
/// itself a known sector ETF, sector is overridden to that ETF's sector
/// label and industry is forced to `"Sector ETF"`.
pub fn enrich(ticker: &str, reference: &ReferenceData) -> Enrichment {
    let ticker = ticker.to_uppercase();

    if let Some(sector) = reference.sector_etfs.get(&ticker) {
        return Enrichment {
            sector: sector.clone(),
            industry: "Sector ETF".to_string(),
            etfs: String::new(),
            etfs_pretty: String::new(),
        };
    }

    let sector = reference.sector_by_ticker.get(&ticker).cloned().unwrap_or_else(|| "Unknown".to_string());
    let industry = reference.industry_by_ticker.get(&ticker).cloned().unwrap_or_else(|| "Unknown".to_string());
    let etfs = reference.etfs_by_ticker.get(&ticker).cloned().unwrap_or_default();
    let etfs_pretty = etfs.split('|').filter(|s| !s.is_empty()).collect::<Vec<_>>().join(", ");

    Enrichment { sector, industry, etfs, etfs_pretty }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn reference() -> ReferenceData {
        let mut r = ReferenceData::default();
        r.sector_by_ticker.insert("AAPL".to_string(), "Information Technology".to_string());
        r.industry_by_ticker.insert("AAPL".to_string(), "Consumer Electronics".to_string());
        r.etfs_by_ticker.insert("AAPL".to_string(), "SPY|QQQ".to_string());
        r.sector_etfs = HashMap::from([("XLK".to_string(), "Information Technology".to_string())]);
        r
    }

    #[test]
    fn joins_known_ticker() {
        let e = enrich("aapl", &reference());
        assert_eq!(e.sector, "Information Technology");
        assert_eq!(e.industry, "Consumer Electronics");
        assert_eq!(e.etfs_pretty, "SPY, QQQ");
    }

    #[test]
    fn defaults_unknown_ticker() {
        let e = enrich("ZZZZ", &reference());
        assert_eq!(e.sector, "Unknown");
        assert_eq!(e.industry, "Unknown");
        assert_eq!(e.etfs, "");
    }

    #[test]
    fn sector_etf_overrides_its_own_row() {
        let e = enrich("XLK", &reference());
        assert_eq!(e.sector, "Information Technology");
        assert_eq!(e.industry, "Sector ETF");
    }
}
