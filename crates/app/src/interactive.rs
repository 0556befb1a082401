use crate::commands::show_cards;
use crate::view::cards::{render_dashboard, render_metric_detail};
use kabu_manager::session::{DashboardCards, DashboardSession};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const HELP: &str = "Commands: r = retry failed cards, w = toggle watchlist, t <TICKER> = switch ticker, e <METRIC_ID> = explain metric, q = quit";

/// 交互模式下的单条指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Retry,
    ToggleWatchlist,
    SwitchTicker(String),
    Explain(String),
    Quit,
    Help,
}

/// # Summary
/// 解析一行输入。
///
/// # Returns
/// 空行或无法识别的输入返回 None；`t` 与 `e` 缺少参数时同样返回 None。
pub fn parse_action(line: &str) -> Option<Action> {
    let mut parts = line.split_whitespace();
    let action = match parts.next()?.to_ascii_lowercase().as_str() {
        "r" | "retry" => Action::Retry,
        "w" | "watch" => Action::ToggleWatchlist,
        "t" | "ticker" => Action::SwitchTicker(parts.next()?.to_string()),
        "e" | "explain" => Action::Explain(parts.next()?.to_ascii_lowercase()),
        "q" | "quit" | "exit" => Action::Quit,
        "h" | "help" | "?" => Action::Help,
        _ => return None,
    };
    Some(action)
}

/// # Summary
/// 交互式仪表盘循环。
///
/// # Logic
/// 1. 首次加载并渲染全部卡片。
/// 2. 逐行读取 stdin：重试失败卡片、切换自选、切换证券或退出。
/// 3. stdin 关闭时同样退出。
pub async fn run(session: &mut DashboardSession) -> anyhow::Result<()> {
    let mut cards = show_cards(session).await?;
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(action) = parse_action(&line) else {
            if !line.trim().is_empty() {
                println!("Unknown command: {}", line.trim());
                println!("{}", HELP);
            }
            continue;
        };
        match action {
            Action::Quit => break,
            Action::Help => println!("{}", HELP),
            Action::Retry => {
                let failed = cards.failed();
                if failed.is_empty() {
                    println!("Nothing to retry.");
                    continue;
                }
                for card in failed {
                    session.retry(card, &mut cards).await?;
                }
                print_dashboard(session, &cards).await;
            }
            Action::ToggleWatchlist => {
                let saved = session.toggle_watchlist().await?;
                let ticker = session.ticker().map(|t| t.to_string()).unwrap_or_default();
                if saved {
                    println!("Added {} to watchlist", ticker);
                } else {
                    println!("Removed {} from watchlist", ticker);
                }
            }
            Action::Explain(id) => match cards.metrics.ready().and_then(|m| m.find(&id)) {
                Some(metric) => print!("{}", render_metric_detail(metric)),
                None => println!("No metric with id {}", id),
            },
            Action::SwitchTicker(raw) => match session.select_ticker(&raw).await {
                Ok(ticker) => {
                    info!(%ticker, "switching ticker");
                    cards = show_cards(session).await?;
                }
                Err(e) => {
                    warn!(error = %e, "ticker rejected");
                    println!("{}", e);
                }
            },
        }
    }
    Ok(())
}

async fn print_dashboard(session: &DashboardSession, cards: &DashboardCards) {
    let settings = session.current_settings().await;
    let saved = session.in_watchlist().await;
    print!("{}", render_dashboard(cards, &settings, saved));
    println!("Location: {}", session.location());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!(parse_action("r"), Some(Action::Retry));
        assert_eq!(parse_action("  W "), Some(Action::ToggleWatchlist));
        assert_eq!(parse_action("t msft"), Some(Action::SwitchTicker("msft".into())));
        assert_eq!(parse_action("e PE_TTM"), Some(Action::Explain("pe_ttm".into())));
        assert_eq!(parse_action("q"), Some(Action::Quit));
        assert_eq!(parse_action("?"), Some(Action::Help));
    }

    #[test]
    fn test_parse_rejects_incomplete_or_unknown() {
        assert_eq!(parse_action(""), None);
        assert_eq!(parse_action("t"), None);
        assert_eq!(parse_action("e"), None);
        assert_eq!(parse_action("zoom"), None);
    }
}
