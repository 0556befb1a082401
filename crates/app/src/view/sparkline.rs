const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// # Summary
/// 将历史序列渲染为一行字符走势图，并附带趋势标记。
///
/// # Logic
/// 1. 按序列的最小/最大值归一化到 8 档字符。
/// 2. 序列平坦时统一使用中间档。
/// 3. 末值不低于首值时标记 `▲`，否则标记 `▼`。
///
/// # Returns
/// 空序列返回空字符串。
pub fn render(history: &[f64]) -> String {
    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        return String::new();
    };
    let min = history.iter().copied().fold(f64::INFINITY, f64::min);
    let max = history.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    let mut line: String = history
        .iter()
        .map(|v| {
            if span <= f64::EPSILON || !span.is_finite() {
                BARS[BARS.len() / 2]
            } else {
                BARS[bucket((v - min) / span)]
            }
        })
        .collect();
    line.push(' ');
    line.push(if last >= first { '▲' } else { '▼' });
    line
}

// 输入为 [0, 1] 内的比例
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bucket(ratio: f64) -> usize {
    let top = BARS.len() - 1;
    ((ratio.clamp(0.0, 1.0) * 7.0).round() as usize).min(top)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rising_series() {
        assert_eq!(render(&[1.0, 2.0, 3.0, 8.0]), "▁▂▃█ ▲");
    }

    #[test]
    fn test_falling_and_flat() {
        assert!(render(&[5.0, 4.0, 1.0]).ends_with('▼'));
        assert_eq!(render(&[2.0, 2.0]), "▅▅ ▲");
        assert_eq!(render(&[]), "");
    }
}
