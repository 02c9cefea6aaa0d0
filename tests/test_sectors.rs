mod common;

use common::*;
use sectorpulse::config::PulseConfig;
use sectorpulse::domain::error::DomainError;
use sectorpulse::domain::values::news_subject::NewsSubject;
use sectorpulse::domain::values::stream::StreamKind;
use std::io::Write;

#[tokio::test]
async fn test_sector_report_combines_quotes_and_news() {
    let h = setup_with(test_config(), ":memory:", -0.4);
    h.quotes.set("LMT", Ok(vec![bar("LMT", 180, 400.0), bar("LMT", 120, 404.0), bar("LMT", 60, 408.0)]));
    h.quotes.set("BA", Ok(vec![bar("BA", 120, 200.0), bar("BA", 60, 180.0)]));
    h.news.set(
        NewsSubject::Symbol("BA".into()),
        Ok(vec![
            article("Boeing faces new lawsuit", "wsj.com", 30),
            article("Boeing delays deliveries", "cnbc.com", 40),
        ]),
    );
    h.news.set(
        NewsSubject::Symbol("LMT".into()),
        Ok(vec![article("Lockheed shares slip", "yahoo.com", 50)]),
    );

    h.pulse.ingest(StreamKind::Quotes).await;
    h.pulse.ingest(StreamKind::News).await;

    let report = h.pulse.sector_report("Defense", 7).unwrap();
    assert_eq!(report.sector, "defense");
    assert_eq!(report.total_news, 3);
    assert_eq!(report.most_active.as_deref(), Some("BA"));
    assert_eq!(report.most_volatile.as_deref(), Some("BA"));
    assert!((report.avg_sentiment + 0.4).abs() < 1e-9);

    let ba = report.symbols.iter().find(|s| s.symbol == "BA").unwrap();
    assert_eq!(ba.news_count, 2);
    assert!((ba.recent_change_pct + 10.0).abs() < 1e-9);
    assert_eq!(ba.top_headlines[0], "Boeing faces new lawsuit");

    // LMT +~0.99%, BA -10% over the last two closes.
    let expected = ((408.0 - 404.0) / 404.0 * 100.0 + -10.0) / 2.0;
    assert!((report.aggregate_return_pct.unwrap() - expected).abs() < 1e-9);
}

#[tokio::test]
async fn test_unknown_sector_is_not_found() {
    let h = setup();
    assert!(matches!(
        h.pulse.sector_report("crypto", 7),
        Err(DomainError::NotFound(_))
    ));
    assert_eq!(h.pulse.sectors().len(), 1);
}

#[tokio::test]
async fn test_prune_drops_old_records() {
    let h = setup();
    h.quotes.set(
        "LMT",
        Ok(vec![bar("LMT", 60 * 24 * 45, 300.0), bar("LMT", 60, 461.0)]),
    );
    h.news.set(
        NewsSubject::Symbol("LMT".into()),
        Ok(vec![article("Lockheed update", "reuters.com", 30)]),
    );
    h.pulse.ingest(StreamKind::Quotes).await;
    h.pulse.ingest(StreamKind::News).await;

    let stats = h.pulse.prune(30).unwrap();

    assert_eq!(stats.quotes, 1);
    assert_eq!(stats.news, 0);
    // The alert was raised now, so it survives.
    assert_eq!(stats.alerts, 0);
    assert_eq!(h.pulse.latest_quotes("LMT", 10).unwrap().len(), 1);
    assert_eq!(h.pulse.recent_alerts(10).unwrap().len(), 1);
    assert!(h.pulse.prune(0).is_err());
}

#[tokio::test]
async fn test_out_of_range_windows_are_rejected() {
    let h = setup();
    assert!(matches!(h.pulse.prune(u32::MAX), Err(DomainError::InvalidInput(_))));
    assert!(matches!(
        h.pulse.sector_report("defense", u32::MAX),
        Err(DomainError::InvalidInput(_))
    ));
    assert!(sectorpulse::hours_ago(u32::MAX).is_none());
    assert!(sectorpulse::hours_ago(24).is_some());
}

#[tokio::test]
async fn test_sector_report_includes_sector_news() {
    let h = setup_with(test_config(), ":memory:", 0.5);
    h.news.set(
        NewsSubject::Symbol("LMT".into()),
        Ok(vec![article("Lockheed Q3 earnings beat", "reuters.com", 30)]),
    );
    h.news.set(
        NewsSubject::Sector("defense".into()),
        Ok(vec![
            article("Defense budget passes Senate", "reuters.com", 20),
            article("Pentagon outlines procurement plan", "reuters.com", 25),
        ]),
    );
    h.pulse.ingest(StreamKind::News).await;

    let report = h.pulse.sector_report("defense", 7).unwrap();

    assert_eq!(report.sector_news_count, 2);
    assert_eq!(report.total_news, 3);
    assert_eq!(report.sector_headlines[0], "Defense budget passes Senate");
    assert!((report.avg_sentiment - 0.5).abs() < 1e-9);
    assert_eq!(report.most_active.as_deref(), Some("LMT"));
    let lmt = report.symbols.iter().find(|s| s.symbol == "LMT").unwrap();
    assert_eq!(lmt.news_count, 1);
}

#[test]
fn test_config_loaded_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r##"{{
            "sectors": {{"energy": {{"color": "#d62728", "symbols": ["xom", "CVX"]}}}},
            "alerts": {{"price_thresholds": {{"XOM": 120.5}}}},
            "quotes": {{"interval": "5m"}}
        }}"##
    )
    .unwrap();

    let config = PulseConfig::load(file.path()).unwrap();
    assert_eq!(config.sector_list()[0].symbols, vec!["XOM", "CVX"]);
    assert_eq!(config.price_thresholds()["XOM"], 120.5);
    assert_eq!(config.quotes.interval.as_str(), "5m");
    assert!(config.quotes.market_hours.is_none());
}

#[test]
fn test_invalid_config_is_fatal() {
    let raw = r##"{"sectors": {"energy": {"color": "#d62728", "symbols": ["XOM"]}},
                   "quotes": {"cadence_secs": 0}}"##;
    assert!(matches!(PulseConfig::from_json(raw), Err(DomainError::Config(_))));

    let raw = r##"{"sectors": {"energy": {"color": "#d62728", "symbols": ["XOM"]}},
                   "news": {"lookback_hours": 4294967295}}"##;
    assert!(matches!(PulseConfig::from_json(raw), Err(DomainError::Config(_))));

    let missing = std::path::Path::new("/nonexistent/sectorpulse.json");
    let config = PulseConfig::load(missing).unwrap();
    assert_eq!(config.sectors.len(), 5);
}
