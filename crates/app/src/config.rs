use anyhow::Context;
use config::{Config, Environment, File};
use kabu_core::config::AppConfig;
use std::path::Path;

/// 环境变量前缀，例如 `KABU__QUERY__RETRY=5`
const ENV_PREFIX: &str = "KABU";
/// 缺省读取的配置文件名 (不含扩展名)
const DEFAULT_CONFIG_NAME: &str = "kabu";

/// # Summary
/// 加载应用配置。
///
/// # Logic
/// 1. 以编译期默认值为最底层。
/// 2. 叠加配置文件：显式给出的路径必须存在，否则尝试可选的 `kabu.toml`。
/// 3. 叠加 `KABU__` 前缀的环境变量，`__` 分隔层级。
///
/// # Returns
/// 合并后的配置；文件格式错误或类型不匹配时返回错误。
pub fn load(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let defaults =
        Config::try_from(&AppConfig::default()).context("failed to encode default config")?;
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
    };
    let config = Config::builder()
        .add_source(defaults)
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("failed to load configuration")?;
    config
        .try_deserialize()
        .context("invalid configuration values")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kabu.toml");
        fs::write(
            &path,
            "[query]\nstale_time_ms = 5000\n\n[feed]\nseed = 7\nlatency_min_ms = 0\nlatency_max_ms = 0\n",
        )
        .unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.query.stale_time_ms, 5000);
        assert_eq!(config.query.retry, 2);
        assert_eq!(config.feed.seed, Some(7));
        assert_eq!(config.feed.latency_max_ms, 0);
        assert_eq!(config.store.data_dir, "data");
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[query]\nretry = \"many\"\n").unwrap();
        assert!(load(Some(&path)).is_err());
    }
}
