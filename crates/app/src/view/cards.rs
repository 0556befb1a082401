use super::badge::{self, BadgeVariant};
use super::format::{
    capitalize, format_as_of, format_confidence, format_currency, format_large_number,
    format_metric_value, format_signed_currency, format_signed_percentage, score_color,
};
use super::sparkline;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use kabu_core::settings::entity::{AnalysisSettings, SettingField};
use kabu_core::stock::catalog::MetricKind;
use kabu_core::stock::entity::{
    Direction, Metric, MetricGroup, StockDecision, StockMetrics, StockSummary,
};
use kabu_manager::session::{Card, CardState, DashboardCards, WatchlistRow};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// 卡片失败时展示的提示
fn failure_message(card: Card) -> &'static str {
    match card {
        Card::Snapshot => "Failed to load stock data. Please try again.",
        Card::Decision => "Failed to load decision data. Please try again.",
        Card::Metrics => "Failed to load metrics. Please try again.",
    }
}

/// # Summary
/// 渲染卡片的加载与失败状态，就绪时交由 `ready` 渲染。
fn render_card<T>(card: Card, state: &CardState<T>, ready: impl FnOnce(&T) -> String) -> String {
    match state {
        CardState::Loading => format!("── {} ──\nLoading {}...\n", card.title(), card.title()),
        CardState::Failed(reason) => format!(
            "── {} ──\n{}\n  ({})\n  [r] Retry\n",
            card.title(),
            failure_message(card),
            reason
        ),
        CardState::Ready(value) => ready(value),
        CardState::Refreshing(value) => format!("{}  (cached data, refreshing...)\n", ready(value)),
    }
}

/// # Summary
/// 行情快照卡片。
///
/// # Logic
/// 1. 标题行包含证券代码、公司名称与市场状态徽章。
/// 2. 价格、涨跌额与涨跌幅，以及快照时间。
/// 3. 关键统计表：市值、成交量、52 周区间与 Beta。
pub fn render_snapshot(state: &CardState<StockSummary>) -> String {
    render_card(Card::Snapshot, state, |summary| {
        let price = &summary.price;
        let stats = &summary.key_stats;
        let (market, variant) = badge::market_status(price.as_of);
        let mut out = String::new();
        out.push_str(&format!("── {} · {} [{}] ──\n", summary.ticker, summary.company, market));

        let mut table = new_table();
        table.set_header(vec!["Price", "Change", "As of", "Market"]);
        let change_color = if summary.is_positive() {
            BadgeVariant::Success
        } else {
            BadgeVariant::Destructive
        };
        table.add_row(vec![
            Cell::new(format_currency(price.last, &price.currency)).add_attribute(Attribute::Bold),
            change_color.cell(&format!(
                "{} ({})",
                format_signed_currency(price.change, &price.currency),
                format_signed_percentage(price.change_pct, 2)
            )),
            Cell::new(format_as_of(price.as_of)),
            variant.cell(market),
        ]);
        out.push_str(&format!("{table}\n"));

        let mut stats_table = new_table();
        stats_table.set_header(vec!["Market Cap", "Volume", "52W Range", "Beta"]);
        stats_table.add_row(vec![
            format_large_number(stats.market_cap),
            format_large_number(stats.volume),
            format!(
                "{} - {}",
                format_currency(stats.range52w.low, &price.currency),
                format_currency(stats.range52w.high, &price.currency)
            ),
            format!("{:.2}", stats.beta),
        ]);
        out.push_str(&format!("{stats_table}\n"));
        out
    })
}

/// # Summary
/// 投资结论卡片，附带结论说明。
///
/// # Logic
/// 1. 结论徽章、按颜色带着色的评分与置信度。
/// 2. 驱动因素以箭头表示方向。
/// 3. 说明部分列出结论备注与当前生效的关键参数。
pub fn render_decision(state: &CardState<StockDecision>, settings: &AnalysisSettings) -> String {
    render_card(Card::Decision, state, |decision| {
        let mut out = String::new();
        out.push_str("── Decision ──\n");

        let mut table = new_table();
        table.set_header(vec!["Verdict", "Score", "Confidence"]);
        table.add_row(vec![
            BadgeVariant::from(decision.decision).cell(&decision.decision.to_string()),
            Cell::new(format!("{}/100", decision.score))
                .fg(score_color(decision.score))
                .add_attribute(Attribute::Bold),
            Cell::new(format_confidence(decision.confidence)),
        ]);
        out.push_str(&format!("{table}\n"));

        let drivers: Vec<String> = decision
            .drivers
            .iter()
            .map(|d| format!("{} {}", arrow(d.direction), d.label))
            .collect();
        out.push_str(&format!("Drivers: {}\n", drivers.join("  ")));
        out.push_str(&render_explanation(decision, settings));
        out
    })
}

fn arrow(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "↑",
        Direction::Down => "↓",
    }
}

/// 结论说明：备注、驱动因素的影响与生效参数
pub fn render_explanation(decision: &StockDecision, settings: &AnalysisSettings) -> String {
    let mut out = String::new();
    out.push_str("Why this decision?\n");
    out.push_str(&format!("  {}\n", decision.notes));
    for driver in &decision.drivers {
        let impact = match driver.direction {
            Direction::Up => "Positive",
            Direction::Down => "Negative",
        };
        out.push_str(&format!(
            "  {} {}: {} impact on decision\n",
            arrow(driver.direction),
            driver.label,
            impact
        ));
    }
    out.push_str("  Current settings:\n");
    for field in [
        SettingField::Preset,
        SettingField::BetaBenchmark,
        SettingField::PeWindow,
        SettingField::EpsWindow,
    ] {
        let title = match field {
            SettingField::Preset => "Outlook",
            other => other.title(),
        };
        out.push_str(&format!("    {}: {}\n", title, capitalize(&settings.value_of(field))));
    }
    out
}

/// # Summary
/// 指标标签页，每组一张表。
///
/// # Arguments
/// * `state`: 指标卡片状态。
/// * `summary`: 行情概要，存在时在 Analyst/News 组后附加推算的目标价。
pub fn render_metrics(state: &CardState<StockMetrics>, summary: Option<&StockSummary>) -> String {
    render_card(Card::Metrics, state, |metrics| {
        let mut out = String::new();
        for group in MetricGroup::ALL {
            out.push_str(&format!("── {} ──\n", group.title()));
            out.push_str(&format!("{}\n", metric_table(metrics.group(group))));
            if let (MetricGroup::Analyst, Some(summary)) = (group, summary) {
                out.push_str(&render_target_price(metrics, summary));
            }
        }
        out
    })
}

fn metric_table(metrics: &[Metric]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Metric", "Value", "Status", "Trend", "Threshold"]);
    for metric in metrics {
        table.add_row(vec![
            Cell::new(&metric.label),
            Cell::new(format_metric_value(metric)).add_attribute(Attribute::Bold),
            BadgeVariant::from(metric.status).cell(&capitalize(&metric.status.to_string())),
            Cell::new(sparkline::render(&metric.history)),
            Cell::new(&metric.threshold),
        ]);
    }
    table
}

/// # Summary
/// 由分析师目标价差推算的目标价。
///
/// # Returns
/// 目标价差缺失或无法解析时返回空字符串。
pub fn render_target_price(metrics: &StockMetrics, summary: &StockSummary) -> String {
    let currency = &summary.price.currency;
    let Some(target) = metrics.target_price(summary.price.last) else {
        return String::new();
    };
    let direction = if target.is_upside() { "upside" } else { "downside" };
    let mut table = new_table();
    table.set_header(vec!["Target Price", "Current", "Difference", "Potential"]);
    table.add_row(vec![
        Cell::new(format_currency(target.target, currency)).add_attribute(Attribute::Bold),
        Cell::new(format_currency(target.current, currency)),
        Cell::new(format_currency(target.difference, currency)),
        badge::target_badge(&target).cell(&format!(
            "{} {}",
            format_signed_percentage(target.gap_pct, 1),
            direction
        )),
    ]);
    format!("Analyst target price\n{table}\n")
}

/// 单个指标的详细说明，包括释义、阈值与公式
pub fn render_metric_detail(metric: &Metric) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}: {}\n", metric.label, format_metric_value(metric)));
    out.push_str(&format!("  Status: {}\n", capitalize(&metric.status.to_string())));
    out.push_str(&format!("  Threshold: {}\n", metric.threshold));
    out.push_str(&format!("  {}\n", metric.explain));
    if let Some(formula) = MetricKind::from_id(&metric.id).and_then(|k| k.formula()) {
        out.push_str(&format!("  Formula: {}\n", formula));
    }
    out
}

/// 单张卡片，指标卡片借用快照中的最新价推算目标价
pub fn render_single(card: Card, cards: &DashboardCards, settings: &AnalysisSettings) -> String {
    match card {
        Card::Snapshot => render_snapshot(&cards.snapshot),
        Card::Decision => render_decision(&cards.decision, settings),
        Card::Metrics => render_metrics(&cards.metrics, cards.snapshot.ready()),
    }
}

/// 当前证券的完整仪表盘
pub fn render_dashboard(
    cards: &DashboardCards,
    settings: &AnalysisSettings,
    in_watchlist: bool,
) -> String {
    let mut out = String::new();
    out.push_str(&render_snapshot(&cards.snapshot));
    let saved = if in_watchlist { "★ saved" } else { "☆ not saved" };
    out.push_str(&format!("Watchlist: {}\n", saved));
    out.push_str(&render_decision(&cards.decision, settings));
    out.push_str(&render_metrics(&cards.metrics, cards.snapshot.ready()));
    out
}

/// # Summary
/// 自选列表视图，每行一只证券。
///
/// # Logic
/// 1. 列表为空时展示引导文本。
/// 2. 行情加载失败的行仍展示代码，保留移除入口。
pub fn render_watchlist(rows: &[WatchlistRow]) -> String {
    if rows.is_empty() {
        return "Your watchlist is empty.\nAdd a ticker with `kabu watchlist add <TICKER>` or press `w` while analyzing.\n".to_string();
    }
    let mut table = new_table();
    table.set_header(vec!["Ticker", "Company", "Price", "Change", "Market Cap"]);
    for row in rows {
        match &row.summary {
            CardState::Ready(summary) | CardState::Refreshing(summary) => {
                let price = &summary.price;
                let variant = if summary.is_positive() {
                    BadgeVariant::Success
                } else {
                    BadgeVariant::Destructive
                };
                table.add_row(vec![
                    Cell::new(summary.ticker.as_str()).add_attribute(Attribute::Bold),
                    Cell::new(&summary.company),
                    Cell::new(format_currency(price.last, &price.currency)),
                    variant.cell(&format_signed_percentage(price.change_pct, 2)),
                    Cell::new(format_large_number(summary.key_stats.market_cap)),
                ]);
            }
            CardState::Loading => {
                table.add_row(vec![row.ticker.as_str(), "Loading...", "", "", ""]);
            }
            CardState::Failed(_) => {
                table.add_row(vec![
                    Cell::new(row.ticker.as_str()).add_attribute(Attribute::Bold),
                    BadgeVariant::Destructive.cell("Failed to load"),
                    BadgeVariant::Outline.cell(&format!("kabu watchlist remove {}", row.ticker)),
                    Cell::new(""),
                    Cell::new(""),
                ]);
            }
        }
    }
    format!("{table}\n")
}

/// 参数一览，非默认值以 `*` 标注
pub fn render_settings(settings: &AnalysisSettings) -> String {
    let defaults = AnalysisSettings::default();
    let mut table = new_table();
    table.set_header(vec!["Setting", "Key", "Value", ""]);
    for field in SettingField::ALL {
        let value = settings.value_of(field);
        let marker = if value == defaults.value_of(field) { "" } else { "*" };
        table.add_row(vec![field.title(), field.storage_key(), value.as_str(), marker]);
    }
    format!("{table}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kabu_core::common::Ticker;
    use kabu_core::stock::entity::{
        Driver, KeyStats, MetricStatus, MetricValue, Range52W, StockPrice, Verdict,
    };

    fn summary() -> StockSummary {
        StockSummary {
            ticker: Ticker::new("AAPL").unwrap(),
            company: "Apple Inc.".to_string(),
            price: StockPrice {
                last: 200.0,
                change: -1.0,
                change_pct: -0.49,
                currency: "USD".to_string(),
                as_of: Utc::now(),
            },
            key_stats: KeyStats {
                market_cap: 3.1e12,
                volume: 45_000_000.0,
                range52w: Range52W { low: 150.0, high: 240.0 },
                beta: 1.234,
            },
        }
    }

    fn decision() -> StockDecision {
        StockDecision {
            score: 75,
            decision: Verdict::Buy,
            confidence: 0.8,
            drivers: vec![
                Driver { label: "Valuation".into(), direction: Direction::Up },
                Driver { label: "Risk".into(), direction: Direction::Down },
            ],
            notes: "Valuation below 3y avg".to_string(),
        }
    }

    fn target_gap(text: &str) -> StockMetrics {
        StockMetrics {
            analyst: vec![Metric {
                id: "target_gap".into(),
                label: "Target Price Gap".into(),
                value: MetricValue::Text(text.into()),
                status: MetricStatus::Good,
                threshold: String::new(),
                explain: String::new(),
                history: vec![1.0, 2.0],
            }],
            ..StockMetrics::default()
        }
    }

    #[test]
    fn test_card_placeholders() {
        let loading: CardState<StockSummary> = CardState::Loading;
        assert!(render_snapshot(&loading).contains("Loading Snapshot"));

        let failed: CardState<StockDecision> = CardState::Failed("boom".into());
        let text = render_decision(&failed, &AnalysisSettings::default());
        assert!(text.contains("Failed to load decision data. Please try again."));
        assert!(text.contains("Retry"));
    }

    #[test]
    fn test_refreshing_card_shows_stale_data() {
        let text = render_snapshot(&CardState::Refreshing(summary()));
        assert!(text.contains("$200.00"));
        assert!(text.contains("refreshing"));

        let cards = DashboardCards {
            snapshot: CardState::Refreshing(summary()),
            ..DashboardCards::default()
        };
        let metrics = render_single(Card::Metrics, &cards, &AnalysisSettings::default());
        assert!(metrics.contains("Loading Metrics"));
    }

    #[test]
    fn test_snapshot_content() {
        let text = render_snapshot(&CardState::Ready(summary()));
        assert!(text.contains("Apple Inc."));
        assert!(text.contains("$200.00"));
        assert!(text.contains("-0.49%"));
        assert!(text.contains("3.10T"));
        assert!(text.contains("$150.00 - $240.00"));
        assert!(text.contains("1.23"));
    }

    #[test]
    fn test_decision_explanation_lists_settings() {
        let text = render_decision(&CardState::Ready(decision()), &AnalysisSettings::default());
        assert!(text.contains("Buy"));
        assert!(text.contains("75/100"));
        assert!(text.contains("80.0%"));
        assert!(text.contains("Valuation: Positive impact on decision"));
        assert!(text.contains("Risk: Negative impact on decision"));
        assert!(text.contains("Outlook: Neutral"));
        assert!(text.contains("Beta Benchmark: SPY"));
    }

    #[test]
    fn test_target_price_rendering() {
        let text = render_target_price(&target_gap("+10.0%"), &summary());
        assert!(text.contains("$220.00"));
        assert!(text.contains("+10.0% upside"));
        assert!(render_target_price(&target_gap("n/a"), &summary()).is_empty());
    }

    #[test]
    fn test_watchlist_empty_and_failed_rows() {
        assert!(render_watchlist(&[]).contains("Your watchlist is empty."));
        let rows = vec![WatchlistRow {
            ticker: Ticker::new("MSFT").unwrap(),
            summary: CardState::Failed("boom".into()),
        }];
        let text = render_watchlist(&rows);
        assert!(text.contains("MSFT"));
        assert!(text.contains("kabu watchlist remove MSFT"));
    }

    #[test]
    fn test_settings_marks_non_default() {
        let settings = AnalysisSettings {
            risk_free_rate: 0.05,
            ..AnalysisSettings::default()
        };
        let text = render_settings(&settings);
        assert!(text.contains("riskFreeRate"));
        assert!(text.contains('*'));
        assert!(!render_settings(&AnalysisSettings::default()).contains('*'));
    }
}
