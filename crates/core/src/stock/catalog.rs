use crate::settings::entity::AnalysisSettings;
use crate::stock::entity::{Metric, MetricGroup, MetricValue, StockMetrics};
use crate::stock::rules::Band;

/// 搜索框提示用的热门证券代码
pub const POPULAR_TICKERS: [&str; 10] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "JPM", "V", "JNJ",
];

/// # Summary
/// 按前缀匹配热门证券代码。
///
/// # Logic
/// 1. 空白输入不返回任何建议。
/// 2. 输入转为大写后做前缀匹配，保持热门列表顺序。
pub fn suggest_tickers(query: &str) -> Vec<&'static str> {
    let query = query.trim().to_uppercase();
    if query.is_empty() {
        return Vec::new();
    }
    POPULAR_TICKERS
        .into_iter()
        .filter(|t| t.starts_with(&query))
        .collect()
}

/// # Summary
/// 指标数值的展示单位。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricUnit {
    // 百分数，展示时追加 %
    Percent,
    // 比率或倍数
    Ratio,
}

/// # Summary
/// 仪表盘支持的全部指标。
///
/// # Invariants
/// - `ALL` 的顺序即各分组内的展示顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    PeTtm,
    PeForward,
    Peg,
    EvEbitda,
    PriceToFcf,
    Sharpe,
    Volatility,
    Beta,
    MaxDrawdown,
    Roic,
    GrossMargin,
    OperatingMargin,
    FcfMargin,
    RevenueCagr,
    EpsGrowth1y,
    EpsGrowthWindow,
    EpsGrowth5y,
    DividendYield,
    PayoutRatio,
    DividendGrowth,
    TargetGap,
    RatingConsensus,
    NewsSentiment,
}

impl MetricKind {
    pub const ALL: [MetricKind; 23] = [
        MetricKind::PeTtm,
        MetricKind::PeForward,
        MetricKind::Peg,
        MetricKind::EvEbitda,
        MetricKind::PriceToFcf,
        MetricKind::Sharpe,
        MetricKind::Volatility,
        MetricKind::Beta,
        MetricKind::MaxDrawdown,
        MetricKind::Roic,
        MetricKind::GrossMargin,
        MetricKind::OperatingMargin,
        MetricKind::FcfMargin,
        MetricKind::RevenueCagr,
        MetricKind::EpsGrowth1y,
        MetricKind::EpsGrowthWindow,
        MetricKind::EpsGrowth5y,
        MetricKind::DividendYield,
        MetricKind::PayoutRatio,
        MetricKind::DividendGrowth,
        MetricKind::TargetGap,
        MetricKind::RatingConsensus,
        MetricKind::NewsSentiment,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            MetricKind::PeTtm => "pe_ttm",
            MetricKind::PeForward => "pe_fwd",
            MetricKind::Peg => "peg",
            MetricKind::EvEbitda => "ev_ebitda",
            MetricKind::PriceToFcf => "p_fcf",
            MetricKind::Sharpe => "sharpe",
            MetricKind::Volatility => "volatility",
            MetricKind::Beta => "beta",
            MetricKind::MaxDrawdown => "max_drawdown",
            MetricKind::Roic => "roic",
            MetricKind::GrossMargin => "gross_margin",
            MetricKind::OperatingMargin => "operating_margin",
            MetricKind::FcfMargin => "fcf_margin",
            MetricKind::RevenueCagr => "revenue_cagr",
            MetricKind::EpsGrowth1y => "eps_growth_1y",
            MetricKind::EpsGrowthWindow => "eps_growth_3y",
            MetricKind::EpsGrowth5y => "eps_growth_5y",
            MetricKind::DividendYield => "dividend_yield",
            MetricKind::PayoutRatio => "payout_ratio",
            MetricKind::DividendGrowth => "dividend_growth",
            MetricKind::TargetGap => "target_gap",
            MetricKind::RatingConsensus => "rating_consensus",
            MetricKind::NewsSentiment => "news_sentiment",
        }
    }

    pub fn from_id(id: &str) -> Option<MetricKind> {
        MetricKind::ALL.into_iter().find(|k| k.id() == id)
    }

    pub fn group(&self) -> MetricGroup {
        match self {
            MetricKind::PeTtm
            | MetricKind::PeForward
            | MetricKind::Peg
            | MetricKind::EvEbitda
            | MetricKind::PriceToFcf => MetricGroup::Valuation,
            MetricKind::Sharpe
            | MetricKind::Volatility
            | MetricKind::Beta
            | MetricKind::MaxDrawdown => MetricGroup::Risk,
            MetricKind::Roic
            | MetricKind::GrossMargin
            | MetricKind::OperatingMargin
            | MetricKind::FcfMargin => MetricGroup::Quality,
            MetricKind::RevenueCagr
            | MetricKind::EpsGrowth1y
            | MetricKind::EpsGrowthWindow
            | MetricKind::EpsGrowth5y => MetricGroup::Growth,
            MetricKind::DividendYield | MetricKind::PayoutRatio | MetricKind::DividendGrowth => {
                MetricGroup::Income
            }
            MetricKind::TargetGap | MetricKind::RatingConsensus | MetricKind::NewsSentiment => {
                MetricGroup::Analyst
            }
        }
    }

    pub fn unit(&self) -> MetricUnit {
        match self {
            MetricKind::PeTtm
            | MetricKind::PeForward
            | MetricKind::Peg
            | MetricKind::EvEbitda
            | MetricKind::PriceToFcf
            | MetricKind::Sharpe
            | MetricKind::Beta
            | MetricKind::RatingConsensus => MetricUnit::Ratio,
            _ => MetricUnit::Percent,
        }
    }

    /// 评级区间，与参数无关
    pub fn band(&self) -> Band {
        use crate::stock::rules::Band::{HigherIsBetter as Higher, LowerIsBetter as Lower};
        match self {
            MetricKind::PeTtm => Lower { good: 22.0, neutral: 30.0 },
            MetricKind::PeForward => Lower { good: 20.0, neutral: 28.0 },
            MetricKind::Peg => Lower { good: 1.0, neutral: 2.0 },
            MetricKind::EvEbitda => Lower { good: 12.0, neutral: 18.0 },
            MetricKind::PriceToFcf => Lower { good: 18.0, neutral: 25.0 },
            MetricKind::Sharpe => Higher { good: 1.0, neutral: 0.5 },
            MetricKind::Volatility => Lower { good: 20.0, neutral: 35.0 },
            MetricKind::Beta => Band::Within {
                good: (0.8, 1.2),
                neutral: (0.6, 1.4),
            },
            MetricKind::MaxDrawdown => Higher { good: -15.0, neutral: -30.0 },
            MetricKind::Roic => Higher { good: 15.0, neutral: 8.0 },
            MetricKind::GrossMargin => Higher { good: 40.0, neutral: 25.0 },
            MetricKind::OperatingMargin => Higher { good: 20.0, neutral: 10.0 },
            MetricKind::FcfMargin => Higher { good: 15.0, neutral: 8.0 },
            MetricKind::RevenueCagr => Higher { good: 15.0, neutral: 8.0 },
            MetricKind::EpsGrowth1y => Higher { good: 10.0, neutral: 0.0 },
            MetricKind::EpsGrowthWindow => Higher { good: 12.0, neutral: 5.0 },
            MetricKind::EpsGrowth5y => Higher { good: 10.0, neutral: 5.0 },
            MetricKind::DividendYield => Higher { good: 3.0, neutral: 1.5 },
            MetricKind::PayoutRatio => Lower { good: 60.0, neutral: 80.0 },
            MetricKind::DividendGrowth => Higher { good: 8.0, neutral: 4.0 },
            MetricKind::TargetGap => Higher { good: 10.0, neutral: 0.0 },
            MetricKind::RatingConsensus => Higher { good: 4.0, neutral: 3.0 },
            MetricKind::NewsSentiment => Higher { good: 60.0, neutral: 40.0 },
        }
    }

    /// 展示名称，部分指标会带上当前参数
    pub fn label(&self, settings: &AnalysisSettings) -> String {
        match self {
            MetricKind::PeTtm => "P/E (TTM)".to_string(),
            MetricKind::PeForward => "P/E (Forward)".to_string(),
            MetricKind::Peg => "PEG Ratio".to_string(),
            MetricKind::EvEbitda => format!(
                "EV/EBITDA ({})",
                settings.ev_ebitda_type.as_str().to_uppercase()
            ),
            MetricKind::PriceToFcf => "P/FCF".to_string(),
            MetricKind::Sharpe => format!(
                "Sharpe ({} days, {}, {:.1}% RF)",
                settings.sharpe_window,
                settings.beta_benchmark,
                settings.risk_free_rate * 100.0
            ),
            MetricKind::Volatility => format!("Volatility ({} days)", settings.volatility_window),
            MetricKind::Beta => format!("Beta vs {}", settings.beta_benchmark),
            MetricKind::MaxDrawdown => "Max Drawdown".to_string(),
            MetricKind::Roic => "ROIC".to_string(),
            MetricKind::GrossMargin => "Gross Margin".to_string(),
            MetricKind::OperatingMargin => "Operating Margin".to_string(),
            MetricKind::FcfMargin => "FCF Margin".to_string(),
            MetricKind::RevenueCagr => "Revenue CAGR (5y)".to_string(),
            MetricKind::EpsGrowth1y => "EPS Growth (1y)".to_string(),
            MetricKind::EpsGrowthWindow => format!("EPS Growth ({})", settings.eps_window),
            MetricKind::EpsGrowth5y => "EPS Growth (5y)".to_string(),
            MetricKind::DividendYield => "Dividend Yield".to_string(),
            MetricKind::PayoutRatio => "Payout Ratio".to_string(),
            MetricKind::DividendGrowth => {
                format!("Dividend Growth ({})", settings.dividend_window)
            }
            MetricKind::TargetGap => "Price vs Target".to_string(),
            MetricKind::RatingConsensus => "Rating Consensus".to_string(),
            MetricKind::NewsSentiment => "News Sentiment".to_string(),
        }
    }

    /// 阈值说明；P/E 类指标附带回溯窗口均值
    pub fn threshold(&self, value: f64, settings: &AnalysisSettings) -> String {
        match self {
            MetricKind::PeTtm => {
                format!("< 22 vs {} avg {:.1}", settings.pe_window, value * 1.1)
            }
            MetricKind::PeForward => {
                format!("< 20 vs {} avg {:.1}", settings.pe_window, value * 1.1)
            }
            MetricKind::Peg => "< 1.0 preferred".to_string(),
            MetricKind::EvEbitda => "< 12 preferred".to_string(),
            MetricKind::PriceToFcf => "< 18 preferred".to_string(),
            MetricKind::Sharpe => "> 1.0 preferred".to_string(),
            MetricKind::Volatility => "< 20% preferred".to_string(),
            MetricKind::Beta => "0.8 - 1.2 preferred".to_string(),
            MetricKind::MaxDrawdown => "> -15% preferred".to_string(),
            MetricKind::Roic => "> 15% preferred".to_string(),
            MetricKind::GrossMargin => "> 40% preferred".to_string(),
            MetricKind::OperatingMargin => "> 20% preferred".to_string(),
            MetricKind::FcfMargin => "> 15% preferred".to_string(),
            MetricKind::RevenueCagr => "> 15% preferred".to_string(),
            MetricKind::EpsGrowth1y => "> 10% preferred".to_string(),
            MetricKind::EpsGrowthWindow => "> 12% preferred".to_string(),
            MetricKind::EpsGrowth5y => "> 10% preferred".to_string(),
            MetricKind::DividendYield => "> 3% preferred".to_string(),
            MetricKind::PayoutRatio => "< 60% preferred".to_string(),
            MetricKind::DividendGrowth => "> 8% preferred".to_string(),
            MetricKind::TargetGap => "> 10% upside preferred".to_string(),
            MetricKind::RatingConsensus => "> 4.0 preferred (5 = Strong Buy)".to_string(),
            MetricKind::NewsSentiment => "> 60% positive preferred".to_string(),
        }
    }

    pub fn explain(&self, settings: &AnalysisSettings) -> String {
        match self {
            MetricKind::PeTtm => "Price/Earnings TTM; lower is cheaper relative to earnings".into(),
            MetricKind::PeForward => {
                "Price/Earnings Forward; based on estimated future earnings".into()
            }
            MetricKind::Peg => {
                "P/E to Growth ratio; lower indicates better value relative to growth".into()
            }
            MetricKind::EvEbitda => "Enterprise Value to EBITDA; measures company valuation".into(),
            MetricKind::PriceToFcf => {
                "Price to Free Cash Flow; lower indicates better cash generation".into()
            }
            MetricKind::Sharpe => "(Return - Risk-free rate) / Standard Deviation; higher is better risk-adjusted return".into(),
            MetricKind::Volatility => {
                "Standard deviation of returns; measures price volatility".into()
            }
            MetricKind::Beta => {
                "Measure of stock volatility relative to market; 1.0 = market average".into()
            }
            MetricKind::MaxDrawdown => {
                "Maximum peak-to-trough decline; measures downside risk".into()
            }
            MetricKind::Roic => {
                "Return on Invested Capital; measures efficiency of capital use".into()
            }
            MetricKind::GrossMargin => {
                "Gross profit / Revenue; measures profitability after cost of goods".into()
            }
            MetricKind::OperatingMargin => {
                "Operating income / Revenue; measures operational profitability".into()
            }
            MetricKind::FcfMargin => {
                "Free Cash Flow / Revenue; measures cash generation efficiency".into()
            }
            MetricKind::RevenueCagr => {
                "Compound Annual Growth Rate of revenue; measures growth trajectory".into()
            }
            MetricKind::EpsGrowth1y => "Earnings per share growth over 1 year".into(),
            MetricKind::EpsGrowthWindow => {
                format!("Earnings per share growth over {}", settings.eps_window)
            }
            MetricKind::EpsGrowth5y => "Earnings per share growth over 5 years".into(),
            MetricKind::DividendYield => "Annual dividend / Stock price; measures income return".into(),
            MetricKind::PayoutRatio => {
                "Dividends / Earnings; lower indicates more room for growth".into()
            }
            MetricKind::DividendGrowth => format!(
                "Average annual dividend growth over {}",
                settings.dividend_window
            ),
            MetricKind::TargetGap => "(Average target price - Current price) / Current price".into(),
            MetricKind::RatingConsensus => {
                "Average analyst rating; 5 = Strong Buy, 1 = Strong Sell".into()
            }
            MetricKind::NewsSentiment => {
                "Percentage of positive news sentiment over recent period".into()
            }
        }
    }

    /// 计算公式或解读说明，仅部分指标提供
    pub fn formula(&self) -> Option<&'static str> {
        match self {
            MetricKind::PeTtm | MetricKind::PeForward => {
                Some("P/E Ratio = Stock Price / Earnings per Share (EPS)")
            }
            MetricKind::Sharpe => {
                Some("Sharpe Ratio = (Return - Risk-free Rate) / Standard Deviation")
            }
            MetricKind::Beta => Some(
                "Beta < 1: Less volatile than market | Beta = 1: Market volatility | Beta > 1: More volatile than market",
            ),
            _ => None,
        }
    }

    /// # Summary
    /// 由原始数值构造完整的指标记录。
    ///
    /// # Logic
    /// 1. 按评级区间对原始数值评级。
    /// 2. 目标价差转为带符号的百分数文本，评级共识保留一位小数文本，其余保持数值。
    /// 3. 填充名称、阈值与释义。
    ///
    /// # Arguments
    /// * `raw`: 原始数值。
    /// * `history`: 历史序列。
    /// * `settings`: 当前分析参数。
    pub fn build(&self, raw: f64, history: Vec<f64>, settings: &AnalysisSettings) -> Metric {
        let value = match self {
            MetricKind::TargetGap => MetricValue::Text(format!(
                "{}{:.1}%",
                if raw > 0.0 { "+" } else { "" },
                raw
            )),
            MetricKind::RatingConsensus => MetricValue::Text(format!("{:.1}", raw)),
            _ => MetricValue::Number(raw),
        };
        Metric {
            id: self.id().to_string(),
            label: self.label(settings),
            value,
            status: self.band().classify(raw),
            threshold: self.threshold(raw, settings),
            explain: self.explain(settings),
            history,
        }
    }
}

/// # Summary
/// 将构造好的指标按分组归集。
///
/// # Logic
/// 按 `MetricKind::group` 追加到对应分组，保持输入顺序。
pub fn assemble_metrics(metrics: impl IntoIterator<Item = (MetricKind, Metric)>) -> StockMetrics {
    let mut bundle = StockMetrics::default();
    for (kind, metric) in metrics {
        bundle.group_mut(kind.group()).push(metric);
    }
    bundle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::entity::{Benchmark, EvEbitdaType, SharpeWindow};
    use crate::stock::entity::MetricStatus;

    #[test]
    fn test_every_group_has_metrics() {
        for group in MetricGroup::ALL {
            assert!(MetricKind::ALL.iter().any(|k| k.group() == group));
        }
    }

    #[test]
    fn test_ids_are_unique_and_round_trip() {
        for kind in MetricKind::ALL {
            assert_eq!(MetricKind::from_id(kind.id()), Some(kind));
        }
    }

    #[test]
    fn test_labels_follow_settings() {
        let settings = AnalysisSettings {
            ev_ebitda_type: EvEbitdaType::Forward,
            sharpe_window: SharpeWindow::Days126,
            beta_benchmark: Benchmark::Qqq,
            risk_free_rate: 0.05,
            ..AnalysisSettings::default()
        };
        assert_eq!(MetricKind::EvEbitda.label(&settings), "EV/EBITDA (FORWARD)");
        assert_eq!(
            MetricKind::Sharpe.label(&settings),
            "Sharpe (126 days, QQQ, 5.0% RF)"
        );
        assert_eq!(MetricKind::Beta.label(&settings), "Beta vs QQQ");
        assert_eq!(
            MetricKind::PeTtm.threshold(20.0, &settings),
            "< 22 vs 3y avg 22.0"
        );
    }

    #[test]
    fn test_build_analyst_text_values() {
        let settings = AnalysisSettings::default();
        let gap = MetricKind::TargetGap.build(12.34, vec![], &settings);
        assert_eq!(gap.value, MetricValue::Text("+12.3%".to_string()));
        assert_eq!(gap.status, MetricStatus::Good);

        let gap = MetricKind::TargetGap.build(-3.0, vec![], &settings);
        assert_eq!(gap.value, MetricValue::Text("-3.0%".to_string()));
        assert_eq!(gap.status, MetricStatus::Poor);

        let rating = MetricKind::RatingConsensus.build(3.55, vec![], &settings);
        assert_eq!(rating.status, MetricStatus::Neutral);
        assert!(matches!(rating.value, MetricValue::Text(_)));
    }

    #[test]
    fn test_assemble_groups() {
        let settings = AnalysisSettings::default();
        let bundle = assemble_metrics(
            MetricKind::ALL
                .into_iter()
                .map(|k| (k, k.build(1.0, vec![1.0], &settings))),
        );
        assert_eq!(bundle.valuation.len(), 5);
        assert_eq!(bundle.risk.len(), 4);
        assert_eq!(bundle.quality.len(), 4);
        assert_eq!(bundle.growth.len(), 4);
        assert_eq!(bundle.income.len(), 3);
        assert_eq!(bundle.analyst.len(), 3);
    }

    #[test]
    fn test_suggestions() {
        assert_eq!(suggest_tickers("a"), vec!["AAPL", "AMZN"]);
        assert_eq!(suggest_tickers(" j"), vec!["JPM", "JNJ"]);
        assert!(suggest_tickers("  ").is_empty());
        assert!(suggest_tickers("ZZZ").is_empty());
    }
}
