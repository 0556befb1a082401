use chrono::{DateTime, Local, Timelike, Utc};
use comfy_table::{Attribute, Cell, Color};
use kabu_core::stock::entity::{MetricStatus, TargetPrice, Verdict};

/// # Summary
/// 徽章的展示样式，所有状态到样式的映射都经过此枚举。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeVariant {
    Success,
    Secondary,
    Destructive,
    Outline,
}

impl BadgeVariant {
    pub fn color(&self) -> Option<Color> {
        match self {
            BadgeVariant::Success => Some(Color::Green),
            BadgeVariant::Secondary => Some(Color::Grey),
            BadgeVariant::Destructive => Some(Color::Red),
            BadgeVariant::Outline => None,
        }
    }

    /// 渲染为表格单元格
    pub fn cell(&self, text: &str) -> Cell {
        let cell = match self {
            BadgeVariant::Outline => Cell::new(format!("[{}]", text)),
            _ => Cell::new(text).add_attribute(Attribute::Bold),
        };
        match self.color() {
            Some(color) => cell.fg(color),
            None => cell,
        }
    }
}

impl From<MetricStatus> for BadgeVariant {
    fn from(status: MetricStatus) -> Self {
        match status {
            MetricStatus::Good => BadgeVariant::Success,
            MetricStatus::Neutral => BadgeVariant::Secondary,
            MetricStatus::Poor => BadgeVariant::Destructive,
        }
    }
}

impl From<Verdict> for BadgeVariant {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Buy => BadgeVariant::Success,
            Verdict::Hold => BadgeVariant::Secondary,
            Verdict::Sell => BadgeVariant::Destructive,
        }
    }
}

/// 目标价徽章：上行空间为 Success，下行超过 5% 为 Destructive
pub fn target_badge(target: &TargetPrice) -> BadgeVariant {
    if target.is_upside() {
        BadgeVariant::Success
    } else if target.gap_pct < -5.0 {
        BadgeVariant::Destructive
    } else {
        BadgeVariant::Secondary
    }
}

/// # Summary
/// 按快照时间的本地小时判断市场状态。
///
/// # Returns
/// 9:00 至 16:00 之间为 ("Open", Success)，其余为 ("Closed", Secondary)。
pub fn market_status(as_of: DateTime<Utc>) -> (&'static str, BadgeVariant) {
    market_status_at_hour(as_of.with_timezone(&Local).hour())
}

fn market_status_at_hour(hour: u32) -> (&'static str, BadgeVariant) {
    if (9..16).contains(&hour) {
        ("Open", BadgeVariant::Success)
    } else {
        ("Closed", BadgeVariant::Secondary)
    }
}
