use async_trait::async_trait;
use chrono::Utc;
use kabu_core::common::Ticker;
use kabu_core::config::FeedConfig;
use kabu_core::settings::entity::AnalysisSettings;
use kabu_core::stock::catalog::{MetricKind, assemble_metrics};
use kabu_core::stock::entity::{
    KeyStats, Range52W, StockDecision, StockMetrics, StockPrice, StockSummary, Verdict,
};
use kabu_core::stock::error::ProviderError;
use kabu_core::stock::port::StockDataProvider;
use kabu_core::stock::rules::{decision_drivers, decision_notes, decision_score};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument};

/// 已知公司的名称目录
const COMPANY_NAMES: [(&str, &str); 10] = [
    ("AAPL", "Apple Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("GOOGL", "Alphabet Inc."),
    ("AMZN", "Amazon.com Inc."),
    ("TSLA", "Tesla, Inc."),
    ("META", "Meta Platforms, Inc."),
    ("NVDA", "NVIDIA Corporation"),
    ("JPM", "JPMorgan Chase & Co."),
    ("V", "Visa Inc."),
    ("JNJ", "Johnson & Johnson"),
];

/// 迷你走势图的历史点数
const HISTORY_LEN: usize = 20;

/// 目录外的代码返回 "`TICKER` Corporation"
pub fn company_name(ticker: &Ticker) -> String {
    COMPANY_NAMES
        .iter()
        .find(|(symbol, _)| *symbol == ticker.as_str())
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| format!("{} Corporation", ticker))
}

/// # Summary
/// 随机生成行情数据的模拟数据源。
///
/// # Invariants
/// - 相同种子、相同调用顺序产生相同数据。
/// - 随机数发生器只在同步临界区内使用，不跨越 `.await`。
pub struct MockStockProvider {
    rng: Mutex<StdRng>,
    // 模拟网络延迟区间
    latency: (Duration, Duration),
}

impl MockStockProvider {
    /// # Summary
    /// 根据配置创建模拟数据源。
    ///
    /// # Logic
    /// 1. 配置了种子时使用确定性随机数，否则使用系统熵。
    /// 2. 延迟区间上限小于下限时按下限处理。
    pub fn new(config: &FeedConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let min = Duration::from_millis(config.latency_min_ms);
        let max = Duration::from_millis(config.latency_max_ms).max(min);
        Self {
            rng: Mutex::new(rng),
            latency: (min, max),
        }
    }

    /// 无延迟的确定性数据源，供测试使用
    pub fn seeded(seed: u64) -> Self {
        Self::new(&FeedConfig {
            latency_min_ms: 0,
            latency_max_ms: 0,
            seed: Some(seed),
        })
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut rng)
    }

    /// 在 [lo, lo + span) 内均匀取值
    fn uniform(&self, lo: f64, span: f64) -> f64 {
        self.with_rng(|rng| lo + rng.random::<f64>() * span)
    }

    async fn simulate_latency(&self) {
        let (min, max) = self.latency;
        if max.is_zero() {
            return;
        }
        let delay = self.with_rng(|rng| rng.random_range(min..=max));
        tokio::time::sleep(delay).await;
    }

    /// # Summary
    /// 以给定值为起点生成随机游走序列。
    ///
    /// # Logic
    /// 1. 每步在起点 ±1% 的幅度内随机扰动。
    /// 2. 起点非负时序列截断在 0 以上，负值指标 (如最大回撤) 保持原样。
    fn history(&self, base: f64) -> Vec<f64> {
        self.with_rng(|rng| {
            let mut current = base;
            (0..HISTORY_LEN)
                .map(|_| {
                    current += (rng.random::<f64>() - 0.5) * base * 0.02;
                    if base >= 0.0 { current.max(0.0) } else { current }
                })
                .collect()
        })
    }

    /// 指标的原始取值区间
    fn sample(&self, kind: MetricKind, pe_ttm: f64) -> f64 {
        match kind {
            MetricKind::PeTtm => pe_ttm,
            MetricKind::PeForward => pe_ttm * self.uniform(0.9, 0.2),
            MetricKind::Peg => self.uniform(0.5, 2.0),
            MetricKind::EvEbitda => self.uniform(10.0, 20.0),
            MetricKind::PriceToFcf => self.uniform(15.0, 25.0),
            MetricKind::Sharpe => self.uniform(0.5, 1.5),
            MetricKind::Volatility => self.uniform(15.0, 25.0),
            MetricKind::Beta => self.uniform(0.8, 0.8),
            MetricKind::MaxDrawdown => -self.uniform(5.0, 20.0),
            MetricKind::Roic => self.uniform(8.0, 20.0),
            MetricKind::GrossMargin => self.uniform(30.0, 50.0),
            MetricKind::OperatingMargin => self.uniform(15.0, 30.0),
            MetricKind::FcfMargin => self.uniform(10.0, 25.0),
            MetricKind::RevenueCagr => self.uniform(5.0, 25.0),
            MetricKind::EpsGrowth1y => self.uniform(-10.0, 30.0),
            MetricKind::EpsGrowthWindow => self.uniform(5.0, 20.0),
            MetricKind::EpsGrowth5y => self.uniform(8.0, 15.0),
            MetricKind::DividendYield => self.uniform(0.0, 5.0),
            MetricKind::PayoutRatio => self.uniform(0.0, 80.0),
            MetricKind::DividendGrowth => self.uniform(2.0, 15.0),
            MetricKind::TargetGap => self.uniform(-10.0, 25.0),
            MetricKind::RatingConsensus => self.uniform(3.0, 2.0),
            MetricKind::NewsSentiment => self.uniform(40.0, 40.0),
        }
    }
}

impl Default for MockStockProvider {
    fn default() -> Self {
        Self::new(&FeedConfig::default())
    }
}

#[async_trait]
impl StockDataProvider for MockStockProvider {
    /// # Summary
    /// 生成行情概要。
    ///
    /// # Logic
    /// 1. 最新价在 [150, 350) 内，涨跌额在 [-5, 5) 内。
    /// 2. 52 周区间为最新价的 0.7 / 1.3 倍。
    #[instrument(skip(self), fields(ticker = %ticker))]
    async fn summary(&self, ticker: &Ticker) -> Result<StockSummary, ProviderError> {
        self.simulate_latency().await;

        let last = self.uniform(150.0, 200.0);
        let change = self.uniform(-5.0, 10.0);
        let summary = StockSummary {
            ticker: ticker.clone(),
            company: company_name(ticker),
            price: StockPrice {
                last,
                change,
                change_pct: change / last * 100.0,
                currency: "USD".to_string(),
                as_of: Utc::now(),
            },
            key_stats: KeyStats {
                market_cap: self.uniform(2.0e12, 3.0e12),
                volume: self.uniform(3.0e7, 5.0e7),
                range52w: Range52W {
                    low: last * 0.7,
                    high: last * 1.3,
                },
                beta: self.uniform(0.8, 0.8),
            },
        };
        debug!(last, change, "summary generated");
        Ok(summary)
    }

    /// # Summary
    /// 生成投资结论。
    ///
    /// # Logic
    /// 1. 评分 = 50 + 预设偏移 + [-15, 15) 的扰动，截断后取整。
    /// 2. 驱动因素与说明都基于取整后的评分。
    /// 3. 置信度在 [0.5, 0.9) 内。
    #[instrument(skip(self, settings), fields(ticker = %ticker, preset = %settings.preset))]
    async fn decision(
        &self,
        ticker: &Ticker,
        settings: &AnalysisSettings,
    ) -> Result<StockDecision, ProviderError> {
        self.simulate_latency().await;

        let score = decision_score(settings.preset, self.uniform(-15.0, 30.0));
        let decision = StockDecision {
            score,
            decision: Verdict::from_score(score),
            confidence: self.uniform(0.5, 0.4),
            drivers: decision_drivers(score),
            notes: decision_notes(score, settings),
        };
        debug!(score, verdict = %decision.decision, "decision generated");
        Ok(decision)
    }

    /// # Summary
    /// 生成六组共 23 个指标。
    ///
    /// # Logic
    /// 1. 按 `MetricKind::ALL` 的顺序依次取值，远期 P/E 以 TTM P/E 为基准。
    /// 2. 目标价差的历史序列以其绝对值为起点。
    #[instrument(skip(self, settings), fields(ticker = %ticker))]
    async fn metrics(
        &self,
        ticker: &Ticker,
        settings: &AnalysisSettings,
    ) -> Result<StockMetrics, ProviderError> {
        self.simulate_latency().await;

        let pe_ttm = self.uniform(15.0, 30.0);
        let metrics = assemble_metrics(MetricKind::ALL.into_iter().map(|kind| {
            let raw = self.sample(kind, pe_ttm);
            let history_base = if kind == MetricKind::TargetGap { raw.abs() } else { raw };
            (kind, kind.build(raw, self.history(history_base), settings))
        }));
        Ok(metrics)
    }
}
