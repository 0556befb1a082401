mod cli;
mod commands;
mod config;
mod container;
mod interactive;
mod logging;
mod view;

use clap::Parser;
use cli::Cli;
use container::Container;
use std::path::Path;
use tracing::{error, info};

/// # Summary
/// 应用启动入口。
///
/// # Logic
/// 1. 解析命令行并加载分层配置。
/// 2. 初始化全局日志 (stderr + 按天滚动文件)。
/// 3. 通过 DI 容器组装存储、行情源与查询层。
/// 4. 执行子命令；本地存储打开失败以非零状态退出。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;
    let _guard = logging::init(Path::new(&config.store.data_dir))?;
    info!(data_dir = %config.store.data_dir, "kabu starting");

    let container = match Container::build(&config, cli.ephemeral).await {
        Ok(container) => container,
        Err(e) => {
            error!(error = %e, "startup failed");
            return Err(e);
        }
    };
    commands::run(&container, cli.command).await
}
