use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 终端版股票分析仪表盘
#[derive(Debug, Parser)]
#[command(name = "kabu", version, about = "Stock analysis dashboard in the terminal")]
pub struct Cli {
    /// 配置文件路径，缺省时读取当前目录下可选的 kabu.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 使用内存存储，不读写本地数据库
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a ticker: snapshot, decision and metrics
    Analyze {
        /// Ticker symbol, e.g. AAPL
        ticker: String,
        /// Shared dashboard location whose settings override the stored ones
        #[arg(long)]
        url: Option<String>,
        /// Keep the dashboard open and read commands from stdin
        #[arg(short, long)]
        interactive: bool,
    },
    /// Open a shared dashboard location
    Open {
        /// Full URL, path or bare query string
        location: String,
        #[arg(short, long)]
        interactive: bool,
    },
    /// Show or edit the watchlist
    Watchlist {
        #[command(subcommand)]
        action: Option<WatchlistAction>,
    },
    /// Show or edit the analysis settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Suggest popular tickers starting with a prefix
    Suggest { prefix: String },
}

#[derive(Debug, Subcommand)]
pub enum WatchlistAction {
    /// List saved tickers with their latest summary
    List,
    Add { ticker: String },
    Remove { ticker: String },
    /// Add the ticker if absent, otherwise remove it
    Toggle { ticker: String },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    Show,
    /// Update settings with field=value assignments, e.g. preset=optimistic rf=0.04
    Set {
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Restore every setting to its default
    Reset,
    /// Print the shareable location for the current settings
    Url {
        #[arg(long)]
        ticker: Option<String>,
    },
}
