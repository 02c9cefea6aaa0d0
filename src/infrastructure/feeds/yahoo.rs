use super::{http_client, network_error, status_error};
use crate::domain::entities::quote_record::QuoteRecord;
use crate::domain::error::FetchError;
use crate::domain::ports::quote_source::QuoteSource;
use crate::domain::values::interval::SamplingInterval;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance OHLCV bars via the v8 chart API (no auth required).
pub struct YahooQuoteSource {
    client: reqwest::Client,
}

impl YahooQuoteSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, serde::Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, serde::Deserialize)]
struct ChartData {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, serde::Deserialize)]
struct ChartMeta {
    symbol: String,
}

#[derive(Debug, serde::Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteArrays>,
}

/// Column arrays; a bar with no trades shows up as `null` in every column.
#[derive(Debug, Default, serde::Deserialize)]
struct QuoteArrays {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Turn a chart payload into bars. Null bars and the bar still open at
/// `now` are skipped; a payload for a different symbol or with ragged
/// columns is malformed.
pub(crate) fn parse_chart(
    body: &str,
    symbol: &str,
    interval: SamplingInterval,
    now: DateTime<Utc>,
) -> Result<Vec<QuoteRecord>, FetchError> {
    let data: ChartResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if let Some(err) = data.chart.error {
        return Err(FetchError::Malformed(format!("Yahoo error: {err}")));
    }

    let chart = data
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::Malformed(format!("Empty chart results for {symbol}")))?;

    if !chart.meta.symbol.eq_ignore_ascii_case(symbol) {
        return Err(FetchError::Malformed(format!(
            "asked for {symbol}, got {}",
            chart.meta.symbol
        )));
    }

    let q = chart.indicators.quote.into_iter().next().unwrap_or_default();
    let n = chart.timestamp.len();
    if [q.open.len(), q.high.len(), q.low.len(), q.close.len()]
        .iter()
        .any(|&len| len != n)
    {
        return Err(FetchError::Malformed(format!(
            "column lengths disagree with {n} timestamps for {symbol}"
        )));
    }

    let mut bars = Vec::with_capacity(n);
    for (i, ts) in chart.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (q.open[i], q.high[i], q.low[i], q.close[i])
        else {
            continue;
        };
        let Some(timestamp) = DateTime::<Utc>::from_timestamp(*ts, 0) else {
            return Err(FetchError::Malformed(format!("bad timestamp {ts} for {symbol}")));
        };
        if timestamp + interval.duration() > now {
            tracing::debug!(symbol = %symbol, %timestamp, "bar still open, skipped");
            continue;
        }
        bars.push(QuoteRecord {
            symbol: symbol.to_uppercase(),
            interval,
            timestamp,
            open,
            high,
            low,
            close,
            volume: q.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }
    Ok(bars)
}

#[async_trait]
impl QuoteSource for YahooQuoteSource {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    async fn fetch_bars(
        &self,
        symbol: &str,
        interval: SamplingInterval,
    ) -> Result<Vec<QuoteRecord>, FetchError> {
        let url = format!(
            "{CHART_URL}/{symbol}?range={}&interval={}",
            interval.provider_range(),
            interval.as_str()
        );

        let resp = self.client.get(&url).send().await.map_err(network_error)?;
        if !resp.status().is_success() {
            return Err(status_error("Yahoo", symbol, resp.status()));
        }

        let body = resp.text().await.map_err(network_error)?;
        parse_chart(&body, symbol, interval, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "LMT"},
                "timestamp": [1709560800, 1709564400, 1709568000],
                "indicators": {"quote": [{
                    "open":   [450.0, null, 452.0],
                    "high":   [455.0, null, 462.0],
                    "low":    [449.0, null, 451.5],
                    "close":  [451.0, null, 461.0],
                    "volume": [1200, null, null]
                }]}
            }],
            "error": null
        }
    }"#;

    fn later() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1709568000 + 7200, 0).unwrap()
    }

    #[test]
    fn test_parse_chart_skips_null_bars() {
        let bars = parse_chart(BODY, "LMT", SamplingInterval::Hourly, later()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 451.0);
        assert_eq!(bars[0].volume, 1200);
        assert_eq!(bars[1].close, 461.0);
        assert_eq!(bars[1].volume, 0);
        assert_eq!(bars[1].interval, SamplingInterval::Hourly);
        assert!(bars[0].timestamp < bars[1].timestamp);
    }

    #[test]
    fn test_parse_chart_symbol_mismatch_is_malformed() {
        let err = parse_chart(BODY, "RTX", SamplingInterval::Hourly, later()).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn test_parse_chart_provider_error() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found"}}}"#;
        assert!(matches!(
            parse_chart(body, "NOPE", SamplingInterval::Daily, later()),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_chart_drops_forming_bar() {
        // Thirty minutes into the 1709568000 bar.
        let now = DateTime::<Utc>::from_timestamp(1709568000 + 1800, 0).unwrap();
        let bars = parse_chart(BODY, "LMT", SamplingInterval::Hourly, now).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 451.0);

        // Exactly at the close of the bar it counts as complete.
        let now = DateTime::<Utc>::from_timestamp(1709568000 + 3600, 0).unwrap();
        assert_eq!(parse_chart(BODY, "LMT", SamplingInterval::Hourly, now).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_chart_ragged_columns_are_malformed() {
        let body = r#"{"chart": {"result": [{
            "meta": {"symbol": "LMT"},
            "timestamp": [1709560800, 1709564400],
            "indicators": {"quote": [{"open": [1.0], "high": [1.0], "low": [1.0], "close": [1.0]}]}
        }], "error": null}}"#;
        assert!(matches!(
            parse_chart(body, "LMT", SamplingInterval::Hourly, later()),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_status_mapping() {
        assert!(status_error("Yahoo", "LMT", reqwest::StatusCode::TOO_MANY_REQUESTS).is_rate_limited());
        assert!(!status_error("Yahoo", "LMT", reqwest::StatusCode::BAD_GATEWAY).is_rate_limited());
    }
}
