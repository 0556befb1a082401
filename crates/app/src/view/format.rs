use chrono::{DateTime, Local, Utc};
use comfy_table::Color;
use kabu_core::stock::catalog::{MetricKind, MetricUnit};
use kabu_core::stock::entity::{Metric, MetricValue};

/// 结论评分达到此值时显示为绿色
const SCORE_GREEN: u8 = 70;
/// 结论评分达到此值时显示为黄色
const SCORE_YELLOW: u8 = 40;

/// 为整数部分插入千位分隔符
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// # Summary
/// 金额格式化，保留两位小数并带千位分隔符。
///
/// # Logic
/// USD 使用 `$` 前缀，其它货币使用 `代码 ` 前缀；负数的负号写在最前。
pub fn format_currency(value: f64, currency: &str) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    let symbol = match currency {
        "USD" => "$".to_string(),
        other => format!("{} ", other),
    };
    format!("{}{}{}.{}", sign, symbol, group_thousands(int_part), frac_part)
}

/// 带符号的金额，正数与零前缀 `+`
pub fn format_signed_currency(value: f64, currency: &str) -> String {
    if value >= 0.0 {
        format!("+{}", format_currency(value, currency))
    } else {
        format_currency(value, currency)
    }
}

pub fn format_percentage(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}

/// 带符号的百分数，例如 `+0.49%`
pub fn format_signed_percentage(value: f64, decimals: usize) -> String {
    if value >= 0.0 {
        format!("+{:.*}%", decimals, value)
    } else {
        format!("{:.*}%", decimals, value)
    }
}

/// # Summary
/// 大数缩写，依次尝试 T/B/M/K，保留两位小数。
pub fn format_large_number(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];
    let magnitude = value.abs();
    UNITS
        .iter()
        .find(|(scale, _)| magnitude >= *scale)
        .map(|(scale, suffix)| format!("{:.2}{}", value / scale, suffix))
        .unwrap_or_else(|| format!("{:.2}", value))
}

/// # Summary
/// 按指标单位格式化取值。
///
/// # Logic
/// 1. 文本取值原样输出。
/// 2. 百分数指标保留两位小数并追加 `%`。
/// 3. 比率指标以及未知指标保留两位小数。
pub fn format_metric_value(metric: &Metric) -> String {
    match &metric.value {
        MetricValue::Text(text) => text.clone(),
        MetricValue::Number(n) => match MetricKind::from_id(&metric.id).map(|k| k.unit()) {
            Some(MetricUnit::Percent) => format_percentage(*n, 2),
            Some(MetricUnit::Ratio) | None => format!("{:.2}", n),
        },
    }
}

/// 快照时间，按本地时区展示
pub fn format_as_of(as_of: DateTime<Utc>) -> String {
    as_of
        .with_timezone(&Local)
        .format("%b %-d, %Y %-I:%M %p")
        .to_string()
}

/// 置信度，`0.85` 展示为 `85.0%`
pub fn format_confidence(confidence: f64) -> String {
    format_percentage(confidence * 100.0, 1)
}

/// 评分颜色带：>= 70 绿色，>= 40 黄色，其余红色
pub fn score_color(score: u8) -> Color {
    if score >= SCORE_GREEN {
        Color::Green
    } else if score >= SCORE_YELLOW {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// 首字母大写
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kabu_core::stock::entity::MetricStatus;

    fn metric(id: &str, value: MetricValue) -> Metric {
        Metric {
            id: id.to_string(),
            label: id.to_string(),
            value,
            status: MetricStatus::Good,
            threshold: String::new(),
            explain: String::new(),
            history: vec![],
        }
    }

    #[test]
    fn test_currency() {
        assert_eq!(format_currency(1234.5, "USD"), "$1,234.50");
        assert_eq!(format_currency(-0.5, "USD"), "-$0.50");
        assert_eq!(format_currency(999.999, "USD"), "$1,000.00");
        assert_eq!(format_currency(12.0, "EUR"), "EUR 12.00");
        assert_eq!(format_signed_currency(1.2, "USD"), "+$1.20");
        assert_eq!(format_signed_currency(-1.2, "USD"), "-$1.20");
    }

    #[test]
    fn test_percentages() {
        assert_eq!(format_percentage(12.345, 2), "12.35%");
        assert_eq!(format_signed_percentage(0.49, 2), "+0.49%");
        assert_eq!(format_signed_percentage(-0.49, 2), "-0.49%");
        assert_eq!(format_confidence(0.853), "85.3%");
    }

    #[test]
    fn test_large_numbers() {
        assert_eq!(format_large_number(2.5e12), "2.50T");
        assert_eq!(format_large_number(1.2e9), "1.20B");
        assert_eq!(format_large_number(35_000_000.0), "35.00M");
        assert_eq!(format_large_number(1_500.0), "1.50K");
        assert_eq!(format_large_number(999.0), "999.00");
    }

    #[test]
    fn test_metric_values_by_unit() {
        assert_eq!(format_metric_value(&metric("roic", MetricValue::Number(12.0))), "12.00%");
        assert_eq!(format_metric_value(&metric("pe_ttm", MetricValue::Number(24.5))), "24.50");
        assert_eq!(
            format_metric_value(&metric("target_gap", MetricValue::Text("+5.2%".into()))),
            "+5.2%"
        );
        assert_eq!(format_metric_value(&metric("unknown", MetricValue::Number(1.0))), "1.00");
    }

    #[test]
    fn test_score_bands_and_capitalize() {
        assert_eq!(score_color(70), Color::Green);
        assert_eq!(score_color(69), Color::Yellow);
        assert_eq!(score_color(40), Color::Yellow);
        assert_eq!(score_color(39), Color::Red);
        assert_eq!(capitalize("neutral"), "Neutral");
        assert_eq!(capitalize(""), "");
    }
}
