use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use strat_core::ScanError;
use universe_scheduler::Stock;

/// The eleven standard GICS sectors, each mapped to one representative
/// sector-tracking ETF. `original_source/app.py` references a
/// `SECTORS_11`/`SECTOR_TOP_ETFS` table that isn't defined anywhere in the
/// kept source files, so this fixes one concretely.
pub const SECTOR_ETFS: &[(&str, &str)] = &[
    ("XLC", "Communication Services"),
    ("XLY", "Consumer Discretionary"),
    ("XLP", "Consumer Staples"),
    ("XLE", "Energy"),
    ("XLF", "Financials"),
    ("XLV", "Health Care"),
    ("XLI", "Industrials"),
    ("XLK", "Information Technology"),
    ("XLB", "Materials"),
    ("XLRE", "Real Estate"),
    ("XLU", "Utilities"),
];

#[derive(Debug, Deserialize)]
struct StockRecord {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Market Cap")]
    market_cap: String,
    #[serde(rename = "Industry")]
    industry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EtfRecord {
    #[serde(rename = "Symbol")]
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct SectorRecord {
    ticker: String,
    sector: String,
}

#[derive(Debug, Deserialize)]
struct HoldingsRecord {
    ticker: String,
    etfs: String,
}

/// Everything C9 and C13 need, loaded once per run from disk.
#[derive(Debug, Default)]
pub struct ReferenceData {
    pub stocks: Vec<Stock>,
    pub etfs: Vec<String>,
    pub industry_by_ticker: HashMap<String, String>,
    pub sector_by_ticker: HashMap<String, String>,
    pub etfs_by_ticker: HashMap<String, String>,
    pub sector_etfs: HashMap<String, String>,
}

impl ReferenceData {
    /// Loads the four input tables from `dir`. A missing or unreadable
    /// required table (`stocks`, `etfs`) is fatal per spec's failure
    /// semantics; sector map and holdings degrade to empty (enrichment
    /// falls back to "Unknown").
    pub fn load(dir: &Path) -> Result<Self, ScanError> {
        let stocks = load_stocks(&dir.join("stocks_biggest.csv"))?;
        let etfs = load_etfs(&dir.join("etfs.csv"))?;
        let sector_by_ticker = load_sector_map(&dir.join("sector_map.csv")).unwrap_or_default();
        let (etfs_by_ticker, industry_by_ticker) = load_holdings_and_industry(&stocks, &dir.join("core_etf_holdings.csv"));

        Ok(ReferenceData {
            stocks: stocks.into_iter().map(|r| Stock { symbol: r.symbol, market_cap: parse_market_cap(&r.market_cap).unwrap_or(0.0) }).collect(),
            etfs,
            industry_by_ticker,
            sector_by_ticker,
            etfs_by_ticker,
            sector_etfs: SECTOR_ETFS.iter().map(|(etf, sector)| (etf.to_string(), sector.to_string())).collect(),
        })
    }
}

fn load_stocks(path: &Path) -> Result<Vec<StockRecord>, ScanError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| ScanError::ReferenceData(format!("{}: {e}", path.display())))?;
    reader
        .deserialize()
        .collect::<Result<Vec<StockRecord>, _>>()
        .map_err(|e| ScanError::ReferenceData(format!("{}: {e}", path.display())))
}

fn load_etfs(path: &Path) -> Result<Vec<String>, ScanError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| ScanError::ReferenceData(format!("{}: {e}", path.display())))?;
    reader
        .deserialize::<EtfRecord>()
        .map(|r| r.map(|r| r.symbol.to_uppercase()))
        .collect::<Result<Vec<String>, _>>()
        .map_err(|e| ScanError::ReferenceData(format!("{}: {e}", path.display())))
}

fn load_sector_map(path: &Path) -> Option<HashMap<String, String>> {
    let mut reader = csv::Reader::from_path(path).ok()?;
    let mut map = HashMap::new();
    for result in reader.deserialize::<SectorRecord>() {
        if let Ok(rec) = result {
            map.insert(rec.ticker.to_uppercase(), rec.sector);
        }
    }
    Some(map)
}

fn load_holdings_and_industry(stocks: &[StockRecord], holdings_path: &Path) -> (HashMap<String, String>, HashMap<String, String>) {
    let industry = stocks
        .iter()
        .filter_map(|s| s.industry.clone().map(|i| (s.symbol.to_uppercase(), i)))
        .collect();

    let mut etfs_by_ticker = HashMap::new();
    if let Ok(mut reader) = csv::Reader::from_path(holdings_path) {
        for result in reader.deserialize::<HoldingsRecord>() {
            if let Ok(rec) = result {
                etfs_by_ticker.insert(rec.ticker.to_uppercase(), rec.etfs);
            }
        }
    }
    (etfs_by_ticker, industry)
}

/// Parses human-formatted market cap strings (`"245.78M"`, `"4.55T"`) and
/// plain integers. Malformed strings yield `None` (dropped row per §8).
pub fn parse_market_cap(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let (number_part, multiplier) = match s.chars().last() {
        Some('K') | Some('k') => (&s[..s.len() - 1], 1_000.0),
        Some('M') | Some('m') => (&s[..s.len() - 1], 1_000_000.0),
        Some('B') | Some('b') => (&s[..s.len() - 1], 1_000_000_000.0),
        Some('T') | Some('t') => (&s[..s.len() - 1], 1_000_000_000_000.0),
        _ => (s, 1.0),
    };
    number_part.trim().parse::<f64>().ok().map(|n| n * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suffixed_market_caps() {
        assert_eq!(parse_market_cap("245.78M"), Some(245_780_000.0));
        assert_eq!(parse_market_cap("4.55T"), Some(4_550_000_000_000.0));
        assert_eq!(parse_market_cap("900K"), Some(900_000.0));
        assert_eq!(parse_market_cap("12345"), Some(12345.0));
    }

    #[test]
    fn rejects_malformed_market_caps() {
        assert_eq!(parse_market_cap("n/a"), None);
        assert_eq!(parse_market_cap(""), None);
    }

    #[test]
    fn sector_etf_table_has_eleven_entries() {
        assert_eq!(SECTOR_ETFS.len(), 11);
    }
}
