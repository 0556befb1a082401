use anyhow::Context;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// # Summary
/// 初始化全局日志。
///
/// # Logic
/// 1. `RUST_LOG` 优先，缺省级别为 info。
/// 2. 控制台日志写到 stderr，stdout 只输出卡片。
/// 3. 同时按天滚动写入 `<data_dir>/logs/kabu.*.log`，写入经由后台线程。
///
/// # Returns
/// 后台写入线程的守卫，进程退出前必须保持存活以刷新缓冲。
pub fn init(data_dir: &Path) -> anyhow::Result<WorkerGuard> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("kabu")
        .filename_suffix("log")
        .build(data_dir.join("logs"))
        .context("failed to create log directory")?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(guard)
}
