use crate::cli::{Command, SettingsAction, WatchlistAction};
use crate::container::Container;
use crate::interactive;
use crate::view::cards;
use anyhow::{Context, anyhow};
use kabu_core::common::Ticker;
use kabu_core::settings::entity::SettingsPatch;
use kabu_core::stock::catalog::suggest_tickers;
use kabu_manager::session::{DashboardCards, DashboardSession};
use tracing::info;

fn parse_ticker(raw: &str) -> anyhow::Result<Ticker> {
    Ticker::new(raw).map_err(|e| anyhow!("invalid ticker {:?}: {}", raw, e))
}

/// # Summary
/// 执行一条子命令，输出写到 stdout。
pub async fn run(container: &Container, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Analyze {
            ticker,
            url,
            interactive,
        } => {
            let ticker = parse_ticker(&ticker)?;
            let mut session = container.session(url.as_deref(), Some(ticker)).await;
            analyze(&mut session, interactive).await
        }
        Command::Open {
            location,
            interactive,
        } => {
            let mut session = container.session(Some(&location), None).await;
            if session.ticker().is_some() {
                analyze(&mut session, interactive).await
            } else {
                info!(%location, "no ticker in location, showing watchlist");
                print!("{}", cards::render_watchlist(&session.watchlist_rows().await));
                Ok(())
            }
        }
        Command::Watchlist { action } => watchlist(container, action).await,
        Command::Settings { action } => settings(container, action).await,
        Command::Suggest { prefix } => {
            let suggestions = suggest_tickers(&prefix);
            if suggestions.is_empty() {
                println!("No matching tickers.");
            }
            for ticker in suggestions {
                println!("{}", ticker);
            }
            Ok(())
        }
    }
}

async fn analyze(session: &mut DashboardSession, interactive: bool) -> anyhow::Result<()> {
    if interactive {
        return interactive::run(session).await;
    }
    show_cards(session).await?;
    Ok(())
}

/// # Summary
/// 渐进式展示当前证券的卡片。
///
/// # Logic
/// 1. 先输出缓存中的状态：加载占位或带刷新标记的过期数据。
/// 2. 之后每张待定卡片一完成就单独输出，不等待其它卡片。
/// 3. 最后输出同步后的地址。
pub(crate) async fn show_cards(session: &DashboardSession) -> anyhow::Result<DashboardCards> {
    let settings = session.current_settings().await;
    let mut dashboard = session.cached_cards().await?;
    let pending = dashboard.pending();
    print!(
        "{}",
        cards::render_dashboard(&dashboard, &settings, session.in_watchlist().await)
    );
    if !pending.is_empty() {
        session
            .refresh_cards(&mut dashboard, |card, current| {
                if pending.contains(&card) {
                    print!("{}", cards::render_single(card, current, &settings));
                }
            })
            .await?;
    }
    println!("Location: {}", session.location());
    Ok(dashboard)
}

async fn watchlist(container: &Container, action: Option<WatchlistAction>) -> anyhow::Result<()> {
    let manager = container.watchlist();
    match action.unwrap_or(WatchlistAction::List) {
        WatchlistAction::List => {
            let session = container.session(None, None).await;
            print!("{}", cards::render_watchlist(&session.watchlist_rows().await));
        }
        WatchlistAction::Add { ticker } => {
            let ticker = parse_ticker(&ticker)?;
            if manager.add(&ticker).await {
                println!("Added {} to watchlist", ticker);
            } else {
                println!("{} is already in the watchlist", ticker);
            }
        }
        WatchlistAction::Remove { ticker } => {
            let ticker = parse_ticker(&ticker)?;
            if manager.remove(&ticker).await {
                println!("Removed {} from watchlist", ticker);
            } else {
                println!("{} is not in the watchlist", ticker);
            }
        }
        WatchlistAction::Toggle { ticker } => {
            let ticker = parse_ticker(&ticker)?;
            if manager.toggle(&ticker).await {
                println!("Added {} to watchlist", ticker);
            } else {
                println!("Removed {} from watchlist", ticker);
            }
        }
    }
    Ok(())
}

async fn settings(container: &Container, action: SettingsAction) -> anyhow::Result<()> {
    match action {
        SettingsAction::Show => {
            let session = container.session(None, None).await;
            print!("{}", cards::render_settings(&session.current_settings().await));
        }
        SettingsAction::Set { assignments } => {
            let patch =
                SettingsPatch::from_assignments(assignments.as_slice()).context("invalid settings")?;
            let mut session = container.session(None, None).await;
            let updated = session.apply_settings(&patch).await;
            print!("{}", cards::render_settings(&updated));
            println!("Location: {}", session.location());
        }
        SettingsAction::Reset => {
            let mut session = container.session(None, None).await;
            let restored = session.reset_settings().await;
            print!("{}", cards::render_settings(&restored));
        }
        SettingsAction::Url { ticker } => {
            let ticker = ticker.as_deref().map(parse_ticker).transpose()?;
            let session = container.session(None, ticker).await;
            println!("{}", session.location());
        }
    }
    Ok(())
}
