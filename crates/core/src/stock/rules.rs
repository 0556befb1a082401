use crate::settings::entity::{AnalysisSettings, OutlookPreset};
use crate::stock::entity::{Direction, Driver, MetricStatus, Verdict};

/// 评分的中性基准
pub const NEUTRAL_BASELINE: f64 = 50.0;
/// 乐观/悲观预设对评分的偏移幅度
pub const PRESET_OFFSET: f64 = 15.0;
/// 评分达到此值即为 Buy
pub const BUY_THRESHOLD: u8 = 70;
/// 评分达到此值即为 Hold
pub const HOLD_THRESHOLD: u8 = 40;

impl OutlookPreset {
    /// 预设对评分的固定偏移
    pub fn score_offset(&self) -> f64 {
        match self {
            OutlookPreset::Pessimistic => -PRESET_OFFSET,
            OutlookPreset::Neutral => 0.0,
            OutlookPreset::Optimistic => PRESET_OFFSET,
        }
    }
}

impl Verdict {
    /// # Summary
    /// 将评分映射为三档结论。
    ///
    /// # Logic
    /// 1. `score >= 70` 为 Buy。
    /// 2. `score >= 40` 为 Hold。
    /// 3. 其余为 Sell。
    pub fn from_score(score: u8) -> Verdict {
        if score >= BUY_THRESHOLD {
            Verdict::Buy
        } else if score >= HOLD_THRESHOLD {
            Verdict::Hold
        } else {
            Verdict::Sell
        }
    }
}

/// # Summary
/// 计算结论评分。
///
/// # Logic
/// 1. 从中性基准 50 出发。
/// 2. 叠加预设偏移与外部给定的扰动。
/// 3. 截断到 [0, 100] 并四舍五入。
///
/// # Arguments
/// * `preset`: 展望预设。
/// * `adjustment`: 扰动量，非有限值按 0 处理。
///
/// # Returns
/// [0, 100] 内的整数评分。
pub fn decision_score(preset: OutlookPreset, adjustment: f64) -> u8 {
    let adjustment = if adjustment.is_finite() { adjustment } else { 0.0 };
    let score = (NEUTRAL_BASELINE + preset.score_offset() + adjustment)
        .clamp(0.0, 100.0)
        .round();
    clamped_to_u8(score)
}

// 调用方保证取值已截断到 [0, 100] 且为整数
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamped_to_u8(value: f64) -> u8 {
    value as u8
}

/// # Summary
/// 根据评分生成驱动因素。
///
/// # Logic
/// - Valuation: 评分 > 60 为正向。
/// - Risk: 评分 > 50 时风险下降。
/// - Growth: 评分 > 55 为正向。
pub fn decision_drivers(score: u8) -> Vec<Driver> {
    let direction = |up: bool| if up { Direction::Up } else { Direction::Down };
    vec![
        Driver {
            label: "Valuation".to_string(),
            direction: direction(score > 60),
        },
        Driver {
            label: "Risk".to_string(),
            direction: direction(score <= 50),
        },
        Driver {
            label: "Growth".to_string(),
            direction: direction(score > 55),
        },
    ]
}

/// 生成结论说明，引用当前的 P/E 回溯窗口
pub fn decision_notes(score: u8, settings: &AnalysisSettings) -> String {
    format!(
        "Valuation {} {} avg; EPS growth {} 10%; volatility {}.",
        if score > 60 { "below" } else { "above" },
        settings.pe_window,
        if score > 55 { ">" } else { "<" },
        if score > 50 { "moderate" } else { "high" },
    )
}

/// # Summary
/// 指标评级区间。
///
/// # Invariants
/// - 所有边界均为开区间，恰好落在边界上的值归入较差的一档。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Band {
    // 越低越好：< good 为 Good，< neutral 为 Neutral
    LowerIsBetter { good: f64, neutral: f64 },
    // 越高越好：> good 为 Good，> neutral 为 Neutral
    HigherIsBetter { good: f64, neutral: f64 },
    // 区间内最好：落入 good 为 Good，落入 neutral 为 Neutral
    Within { good: (f64, f64), neutral: (f64, f64) },
}

impl Band {
    pub fn classify(&self, value: f64) -> MetricStatus {
        let (is_good, is_neutral) = match *self {
            Band::LowerIsBetter { good, neutral } => (value < good, value < neutral),
            Band::HigherIsBetter { good, neutral } => (value > good, value > neutral),
            Band::Within { good, neutral } => (
                value > good.0 && value < good.1,
                value > neutral.0 && value < neutral.1,
            ),
        };
        if is_good {
            MetricStatus::Good
        } else if is_neutral {
            MetricStatus::Neutral
        } else {
            MetricStatus::Poor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_mapping() {
        assert_eq!(Verdict::from_score(75), Verdict::Buy);
        assert_eq!(Verdict::from_score(70), Verdict::Buy);
        assert_eq!(Verdict::from_score(69), Verdict::Hold);
        assert_eq!(Verdict::from_score(55), Verdict::Hold);
        assert_eq!(Verdict::from_score(40), Verdict::Hold);
        assert_eq!(Verdict::from_score(39), Verdict::Sell);
        assert_eq!(Verdict::from_score(20), Verdict::Sell);
        assert_eq!(Verdict::from_score(0), Verdict::Sell);
        assert_eq!(Verdict::from_score(100), Verdict::Buy);
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(decision_score(OutlookPreset::Optimistic, 1_000.0), 100);
        assert_eq!(decision_score(OutlookPreset::Pessimistic, -1_000.0), 0);
        assert_eq!(decision_score(OutlookPreset::Neutral, f64::NAN), 50);
        assert_eq!(decision_score(OutlookPreset::Neutral, f64::INFINITY), 50);
        for step in -40..=40 {
            let adj = f64::from(step);
            for preset in OutlookPreset::ALL {
                assert!(decision_score(*preset, adj) <= 100);
            }
        }
    }

    #[test]
    fn test_score_applies_preset_offset() {
        assert_eq!(decision_score(OutlookPreset::Neutral, 0.0), 50);
        assert_eq!(decision_score(OutlookPreset::Optimistic, 0.0), 65);
        assert_eq!(decision_score(OutlookPreset::Pessimistic, 0.0), 35);
        assert_eq!(decision_score(OutlookPreset::Optimistic, 9.6), 75);
    }

    #[test]
    fn test_drivers_follow_score() {
        let high = decision_drivers(80);
        assert_eq!(high[0].direction, Direction::Up);
        assert_eq!(high[1].direction, Direction::Down);
        assert_eq!(high[2].direction, Direction::Up);

        let low = decision_drivers(30);
        assert_eq!(low[0].direction, Direction::Down);
        assert_eq!(low[1].direction, Direction::Up);
        assert_eq!(low[2].direction, Direction::Down);
    }

    #[test]
    fn test_notes_interpolate_pe_window() {
        let notes = decision_notes(70, &AnalysisSettings::default());
        assert_eq!(
            notes,
            "Valuation below 3y avg; EPS growth > 10%; volatility moderate."
        );
        let notes = decision_notes(20, &AnalysisSettings::default());
        assert_eq!(notes, "Valuation above 3y avg; EPS growth < 10%; volatility high.");
    }

    #[test]
    fn test_bands() {
        let lower = Band::LowerIsBetter { good: 22.0, neutral: 30.0 };
        assert_eq!(lower.classify(15.0), MetricStatus::Good);
        assert_eq!(lower.classify(22.0), MetricStatus::Neutral);
        assert_eq!(lower.classify(30.0), MetricStatus::Poor);

        let higher = Band::HigherIsBetter { good: 1.0, neutral: 0.5 };
        assert_eq!(higher.classify(1.5), MetricStatus::Good);
        assert_eq!(higher.classify(0.7), MetricStatus::Neutral);
        assert_eq!(higher.classify(0.5), MetricStatus::Poor);

        let within = Band::Within { good: (0.8, 1.2), neutral: (0.6, 1.4) };
        assert_eq!(within.classify(1.0), MetricStatus::Good);
        assert_eq!(within.classify(1.3), MetricStatus::Neutral);
        assert_eq!(within.classify(0.5), MetricStatus::Poor);
    }
}
