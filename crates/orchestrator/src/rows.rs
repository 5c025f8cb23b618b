use serde::Serialize;

/// One emitted setup, flattened to the `results.csv`/`results.json` schema.
#[derive(Debug, Clone, Serialize)]
pub struct ResultRow {
    pub scan_time: String,
    pub ticker: String,
    pub chart_url: String,
    pub current_price: Option<f64>,
    pub tf: String,
    pub pattern: String,
    pub setup: String,
    pub dir: String,
    pub entry: f64,
    pub stop: f64,
    pub score: i32,
    pub aligned: String,
    pub last_strat: String,
    pub last_candle_type: String,
    pub actionable: bool,
    pub note: String,
    pub sector: String,
    pub industry: String,
    pub etfs: String,
    pub etfs_pretty: String,
    #[serde(rename = "ctx_Y")]
    pub ctx_y: String,
    #[serde(rename = "ctx_Q")]
    pub ctx_q: String,
    #[serde(rename = "ctx_M")]
    pub ctx_m: String,
    #[serde(rename = "ctx_W")]
    pub ctx_w: String,
    #[serde(rename = "ctx_D")]
    pub ctx_d: String,
}

/// One per-symbol summary row, flattened to the `context.csv` schema. Used
/// by the downstream sector heatmap. `_closed` is the last-closed
/// classification per timeframe; `_live` is the classification of the
/// frame's very last bar, which may still be in progress.
#[derive(Debug, Clone, Serialize)]
pub struct ContextRow {
    pub scan_time: String,
    pub ticker: String,
    pub current_price: Option<f64>,
    #[serde(rename = "ctx_Y_closed")]
    pub ctx_y_closed: String,
    #[serde(rename = "ctx_Q_closed")]
    pub ctx_q_closed: String,
    #[serde(rename = "ctx_M_closed")]
    pub ctx_m_closed: String,
    #[serde(rename = "ctx_W_closed")]
    pub ctx_w_closed: String,
    #[serde(rename = "ctx_D_closed")]
    pub ctx_d_closed: String,
    #[serde(rename = "ctx_Y_live")]
    pub ctx_y_live: String,
    #[serde(rename = "ctx_Q_live")]
    pub ctx_q_live: String,
    #[serde(rename = "ctx_M_live")]
    pub ctx_m_live: String,
    #[serde(rename = "ctx_W_live")]
    pub ctx_w_live: String,
    #[serde(rename = "ctx_D_live")]
    pub ctx_d_live: String,
    pub score: i32,
    pub sector: String,
    pub industry: String,
}
