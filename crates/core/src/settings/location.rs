use super::entity::{AnalysisSettings, SettingsPatch};
use crate::common::Ticker;
use url::form_urlencoded;

/// 分享链接中证券代码的参数名
pub const TICKER_PARAM: &str = "ticker";

/// # Summary
/// 从地址中解析出的仪表盘状态。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationState {
    // 地址中携带的证券代码
    pub ticker: Option<Ticker>,
    // 地址中携带的合法参数覆盖
    pub overrides: SettingsPatch,
}

/// 截取地址中的查询串部分，丢弃片段标识
fn query_part(location: &str) -> &str {
    let without_fragment = location.split('#').next().unwrap_or_default();
    match without_fragment.split_once('?') {
        Some((_, query)) => query,
        None if without_fragment.contains('=') => without_fragment,
        None => "",
    }
}

/// # Summary
/// 解析完整 URL、路径或裸查询串中的证券代码与参数覆盖。
///
/// # Logic
/// 1. 截取 `?` 之后、`#` 之前的查询串；没有 `?` 但含 `=` 时视整体为查询串。
/// 2. 按 application/x-www-form-urlencoded 解码参数对。
/// 3. `ticker` 取第一次出现的非空值，参数覆盖交由 `SettingsPatch` 校验。
///
/// # Arguments
/// * `location`: 例如 `https://host/?ticker=aapl&preset=optimistic`。
///
/// # Returns
/// 解析得到的状态，非法部分被忽略。
pub fn parse_location(location: &str) -> LocationState {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query_part(location).as_bytes())
        .into_owned()
        .collect();

    let ticker = pairs
        .iter()
        .filter(|(k, _)| k == TICKER_PARAM)
        .find_map(|(_, v)| Ticker::new(v).ok());

    LocationState {
        ticker,
        overrides: SettingsPatch::from_query_pairs(pairs.iter().map(|(k, v)| (k, v))),
    }
}

/// # Summary
/// 生成只包含非默认参数的地址，使分享链接保持简短。
///
/// # Logic
/// 1. 若提供证券代码，首先写入 `ticker`。
/// 2. 按固定顺序写入与默认值不同的字段。
/// 3. 无任何参数时返回纯路径。
///
/// # Arguments
/// * `path`: 地址的路径部分。
/// * `settings`: 当前参数。
/// * `ticker`: 可选的当前证券代码。
///
/// # Returns
/// `path` 或 `path?query`。
pub fn build_location(path: &str, settings: &AnalysisSettings, ticker: Option<&Ticker>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut has_params = false;

    if let Some(ticker) = ticker {
        serializer.append_pair(TICKER_PARAM, ticker.as_str());
        has_params = true;
    }
    for (field, value) in settings.non_default_fields() {
        serializer.append_pair(field.query_key(), &value);
        has_params = true;
    }

    if has_params {
        format!("{}?{}", path, serializer.finish())
    } else {
        path.to_string()
    }
}
