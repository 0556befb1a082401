use crate::common::Ticker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 最新价格快照。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPrice {
    // 最新成交价
    pub last: f64,
    // 涨跌额
    pub change: f64,
    // 涨跌幅 (百分数，例如 -0.49 表示 -0.49%)
    pub change_pct: f64,
    // 计价货币
    pub currency: String,
    // 快照时间
    pub as_of: DateTime<Utc>,
}

/// # Summary
/// 52 周价格区间。
///
/// # Invariants
/// - `low` <= `high`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range52W {
    pub low: f64,
    pub high: f64,
}

/// # Summary
/// 关键统计数据。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStats {
    pub market_cap: f64,
    pub volume: f64,
    pub range52w: Range52W,
    pub beta: f64,
}

/// # Summary
/// 行情概要，快照卡片与自选列表的数据来源。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub ticker: Ticker,
    // 公司名称
    pub company: String,
    pub price: StockPrice,
    pub key_stats: KeyStats,
}

impl StockSummary {
    /// 当日是否上涨 (含平盘)
    pub fn is_positive(&self) -> bool {
        self.price.change >= 0.0
    }
}

/// # Summary
/// 三档投资结论。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Buy,
    Hold,
    Sell,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Buy => write!(f, "Buy"),
            Verdict::Hold => write!(f, "Hold"),
            Verdict::Sell => write!(f, "Sell"),
        }
    }
}

/// # Summary
/// 驱动因素对结论的影响方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// # Summary
/// 结论的单个驱动因素。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub label: String,
    pub direction: Direction,
}

/// # Summary
/// 投资结论。
///
/// # Invariants
/// - `score` 位于 [0, 100]。
/// - `decision` 与 `score` 的映射满足 `Verdict::from_score`。
/// - `confidence` 为 [0, 1] 内的小数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDecision {
    pub score: u8,
    pub decision: Verdict,
    pub confidence: f64,
    pub drivers: Vec<Driver>,
    // 结论说明文本
    pub notes: String,
}

/// # Summary
/// 指标的三档评级。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Good,
    Neutral,
    Poor,
}

impl std::fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricStatus::Good => write!(f, "Good"),
            MetricStatus::Neutral => write!(f, "Neutral"),
            MetricStatus::Poor => write!(f, "Poor"),
        }
    }
}

/// # Summary
/// 指标取值，可以是数值或预先格式化的文本。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

/// # Summary
/// 单个指标记录。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    // 稳定标识，例如 pe_ttm
    pub id: String,
    // 展示名称，可能包含当前参数
    pub label: String,
    pub value: MetricValue,
    pub status: MetricStatus,
    // 阈值说明
    pub threshold: String,
    // 指标释义
    pub explain: String,
    // 用于迷你走势图的历史序列
    pub history: Vec<f64>,
}

/// # Summary
/// 指标分组，对应仪表盘的六个标签页。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricGroup {
    Valuation,
    Risk,
    Quality,
    Growth,
    Income,
    Analyst,
}

impl MetricGroup {
    pub const ALL: [MetricGroup; 6] = [
        MetricGroup::Valuation,
        MetricGroup::Risk,
        MetricGroup::Quality,
        MetricGroup::Growth,
        MetricGroup::Income,
        MetricGroup::Analyst,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            MetricGroup::Valuation => "Valuation",
            MetricGroup::Risk => "Risk/Return",
            MetricGroup::Quality => "Quality",
            MetricGroup::Growth => "Growth",
            MetricGroup::Income => "Income",
            MetricGroup::Analyst => "Analyst/News",
        }
    }
}

/// # Summary
/// 六组指标的集合。
///
/// # Invariants
/// - 每组都至少包含一个指标。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StockMetrics {
    pub valuation: Vec<Metric>,
    pub risk: Vec<Metric>,
    pub quality: Vec<Metric>,
    pub growth: Vec<Metric>,
    pub income: Vec<Metric>,
    pub analyst: Vec<Metric>,
}

impl StockMetrics {
    pub fn group(&self, group: MetricGroup) -> &[Metric] {
        match group {
            MetricGroup::Valuation => &self.valuation,
            MetricGroup::Risk => &self.risk,
            MetricGroup::Quality => &self.quality,
            MetricGroup::Growth => &self.growth,
            MetricGroup::Income => &self.income,
            MetricGroup::Analyst => &self.analyst,
        }
    }

    pub fn group_mut(&mut self, group: MetricGroup) -> &mut Vec<Metric> {
        match group {
            MetricGroup::Valuation => &mut self.valuation,
            MetricGroup::Risk => &mut self.risk,
            MetricGroup::Quality => &mut self.quality,
            MetricGroup::Growth => &mut self.growth,
            MetricGroup::Income => &mut self.income,
            MetricGroup::Analyst => &mut self.analyst,
        }
    }

    /// 按 id 在全部分组中查找指标
    pub fn find(&self, id: &str) -> Option<&Metric> {
        MetricGroup::ALL
            .into_iter()
            .flat_map(|g| self.group(g).iter())
            .find(|m| m.id == id)
    }

    /// # Summary
    /// 由分析师目标价差推算目标价格。
    ///
    /// # Logic
    /// 1. 查找 `target_gap` 指标，去掉 `%` 后解析带符号的百分数。
    /// 2. 目标价 = 最新价 × (1 + 价差 / 100)。
    ///
    /// # Arguments
    /// * `last_price`: 最新成交价。
    ///
    /// # Returns
    /// 指标缺失或无法解析时返回 None。
    pub fn target_price(&self, last_price: f64) -> Option<TargetPrice> {
        let metric = self.find("target_gap")?;
        let gap_pct = match &metric.value {
            MetricValue::Number(n) => *n,
            MetricValue::Text(t) => t.trim().trim_end_matches('%').parse::<f64>().ok()?,
        };
        if !gap_pct.is_finite() {
            return None;
        }
        let target = last_price * (1.0 + gap_pct / 100.0);
        Some(TargetPrice {
            target,
            current: last_price,
            gap_pct,
            difference: (target - last_price).abs(),
        })
    }
}

/// # Summary
/// 由分析师共识推算出的目标价。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPrice {
    pub target: f64,
    pub current: f64,
    // 目标价相对现价的百分比差
    pub gap_pct: f64,
    // 目标价与现价的绝对差
    pub difference: f64,
}

impl TargetPrice {
    pub fn is_upside(&self) -> bool {
        self.gap_pct > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(id: &str, value: MetricValue) -> Metric {
        Metric {
            id: id.to_string(),
            label: id.to_string(),
            value,
            status: MetricStatus::Neutral,
            threshold: String::new(),
            explain: String::new(),
            history: vec![],
        }
    }

    #[test]
    fn test_target_price_from_signed_text() {
        let metrics = StockMetrics {
            analyst: vec![metric("target_gap", MetricValue::Text("+10.0%".to_string()))],
            ..StockMetrics::default()
        };
        let target = metrics.target_price(200.0).unwrap();
        assert!((target.target - 220.0).abs() < 1e-9);
        assert!((target.difference - 20.0).abs() < 1e-9);
        assert!(target.is_upside());

        let metrics = StockMetrics {
            analyst: vec![metric("target_gap", MetricValue::Text("-5.5%".to_string()))],
            ..StockMetrics::default()
        };
        let target = metrics.target_price(100.0).unwrap();
        assert!((target.target - 94.5).abs() < 1e-9);
        assert!(!target.is_upside());
    }

    #[test]
    fn test_target_price_missing_or_garbled() {
        assert!(StockMetrics::default().target_price(100.0).is_none());
        let metrics = StockMetrics {
            analyst: vec![metric("target_gap", MetricValue::Text("n/a".to_string()))],
            ..StockMetrics::default()
        };
        assert!(metrics.target_price(100.0).is_none());
    }

    #[test]
    fn test_metric_value_untagged_serde() {
        let n: MetricValue = serde_json::from_str("12.5").unwrap();
        assert_eq!(n, MetricValue::Number(12.5));
        let t: MetricValue = serde_json::from_str("\"4.1\"").unwrap();
        assert_eq!(t, MetricValue::Text("4.1".to_string()));
    }
}
