use kabu_core::common::Ticker;
use kabu_core::config::FeedConfig;
use kabu_core::settings::entity::{AnalysisSettings, Benchmark, EvEbitdaType, OutlookPreset};
use kabu_core::stock::entity::{MetricGroup, MetricStatus, MetricValue, Verdict};
use kabu_core::stock::port::StockDataProvider;
use kabu_feed::mock::MockStockProvider;
use std::time::{Duration, Instant};

fn aapl() -> Ticker {
    Ticker::new("AAPL").unwrap()
}

#[tokio::test]
async fn test_aapl_metrics_have_six_groups() -> anyhow::Result<()> {
    let provider = MockStockProvider::seeded(42);
    let metrics = provider.metrics(&aapl(), &AnalysisSettings::default()).await?;

    let mut total = 0;
    for group in MetricGroup::ALL {
        let items = metrics.group(group);
        assert!(!items.is_empty(), "group {:?} is empty", group);
        for metric in items {
            assert!(matches!(
                metric.status,
                MetricStatus::Good | MetricStatus::Neutral | MetricStatus::Poor
            ));
            assert_eq!(metric.history.len(), 20);
        }
        total += items.len();
    }
    assert_eq!(total, 23);
    Ok(())
}

#[tokio::test]
async fn test_metric_labels_follow_settings() -> anyhow::Result<()> {
    let provider = MockStockProvider::seeded(1);
    let settings = AnalysisSettings {
        beta_benchmark: Benchmark::Qqq,
        ev_ebitda_type: EvEbitdaType::Forward,
        ..AnalysisSettings::default()
    };
    let metrics = provider.metrics(&aapl(), &settings).await?;

    assert_eq!(metrics.find("beta").unwrap().label, "Beta vs QQQ");
    assert_eq!(metrics.find("ev_ebitda").unwrap().label, "EV/EBITDA (FORWARD)");
    assert!(matches!(
        metrics.find("target_gap").unwrap().value,
        MetricValue::Text(_)
    ));
    assert!(metrics.target_price(100.0).is_some());
    Ok(())
}

#[tokio::test]
async fn test_summary_shape() -> anyhow::Result<()> {
    let provider = MockStockProvider::seeded(3);
    let summary = provider.summary(&Ticker::new("unknown")?).await?;

    assert_eq!(summary.ticker.as_str(), "UNKNOWN");
    assert_eq!(summary.company, "UNKNOWN Corporation");
    assert_eq!(summary.price.currency, "USD");
    let last = summary.price.last;
    assert!((150.0..350.0).contains(&last));
    assert!((summary.key_stats.range52w.low - last * 0.7).abs() < 1e-9);
    assert!((summary.key_stats.range52w.high - last * 1.3).abs() < 1e-9);
    assert!((summary.price.change_pct - summary.price.change / last * 100.0).abs() < 1e-9);
    Ok(())
}

#[tokio::test]
async fn test_decision_respects_preset_range() -> anyhow::Result<()> {
    let provider = MockStockProvider::seeded(9);
    for preset in OutlookPreset::ALL {
        let settings = AnalysisSettings {
            preset: *preset,
            ..AnalysisSettings::default()
        };
        for _ in 0..50 {
            let decision = provider.decision(&aapl(), &settings).await?;
            let centre = 50.0 + preset.score_offset();
            assert!(f64::from(decision.score) >= centre - 15.0);
            assert!(f64::from(decision.score) <= centre + 15.0);
            assert_eq!(decision.decision, Verdict::from_score(decision.score));
            assert!((0.5..0.9).contains(&decision.confidence));
            assert_eq!(decision.drivers.len(), 3);
            assert!(decision.notes.contains("3y avg"));
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_same_seed_is_deterministic() -> anyhow::Result<()> {
    let settings = AnalysisSettings::default();
    let a = MockStockProvider::seeded(11).metrics(&aapl(), &settings).await?;
    let b = MockStockProvider::seeded(11).metrics(&aapl(), &settings).await?;
    assert_eq!(a, b);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_latency_is_simulated() -> anyhow::Result<()> {
    let provider = MockStockProvider::new(&FeedConfig {
        latency_min_ms: 300,
        latency_max_ms: 500,
        seed: Some(5),
    });
    let started = Instant::now();
    let clock = tokio::time::Instant::now();
    provider.summary(&aapl()).await?;
    let elapsed = clock.elapsed();
    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed <= Duration::from_millis(500));
    // 时间被暂停，实际耗时远小于模拟延迟
    assert!(started.elapsed() < Duration::from_millis(300));
    Ok(())
}
