use kabu_cache::mem::MemCache;
use kabu_core::cache::port::{Cache, CacheExt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Entry {
    value: Vec<f64>,
    fetched_at: i64,
}

#[tokio::test]
async fn test_mem_cache_raw_ops() {
    let cache = MemCache::new();
    let key = r#"["stock","summary","AAPL"]"#;
    let value = vec![1, 2, 3, 4];

    cache.set_raw(key, value.clone()).await.unwrap();
    assert_eq!(cache.get_raw(key).await.unwrap().unwrap(), value);

    // 覆盖写入
    cache.set_raw(key, vec![9]).await.unwrap();
    assert_eq!(cache.get_raw(key).await.unwrap().unwrap(), vec![9]);
    assert_eq!(cache.len(), 1);

    cache.del(key).await.unwrap();
    assert!(cache.get_raw(key).await.unwrap().is_none());
    // 删除不存在的键同样成功
    cache.del(key).await.unwrap();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_mem_cache_typed_ops() {
    let cache = MemCache::new();
    let entry = Entry {
        value: vec![1.5, 2.5],
        fetched_at: 1_700_000_000_000,
    };

    cache.set("typed", &entry).await.unwrap();
    let result: Entry = cache.get("typed").await.unwrap().unwrap();
    assert_eq!(result, entry);

    let missing: Option<Entry> = cache.get("missing").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_mem_cache_typed_decode_error() {
    let cache = MemCache::new();
    cache.set_raw("garbage", b"not json".to_vec()).await.unwrap();
    let result: Result<Option<Entry>, _> = cache.get("garbage").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_mem_cache_keys_by_prefix() {
    let cache = MemCache::new();
    cache.set_raw(r#"["stock","summary","AAPL"]"#, vec![1]).await.unwrap();
    cache.set_raw(r#"["stock","metrics","AAPL"]"#, vec![2]).await.unwrap();
    cache.set_raw(r#"["other","x"]"#, vec![3]).await.unwrap();

    let mut keys = cache.keys(r#"["stock""#).await.unwrap();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            r#"["stock","metrics","AAPL"]"#.to_string(),
            r#"["stock","summary","AAPL"]"#.to_string(),
        ]
    );
    assert_eq!(cache.keys("").await.unwrap().len(), 3);

    cache.clear();
    assert!(cache.keys("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_typed_floats_round_trip_exactly() {
    let cache = MemCache::new();
    // 这些值在非精确的十进制解析下会丢失最后一位
    let entry = Entry {
        value: vec![0.427_252_099_031_438_35, 0.1 + 0.2, 1.0 / 3.0, 218.357_914_213_570_2],
        fetched_at: 0,
    };

    cache.set("floats", &entry).await.unwrap();
    let back: Entry = cache.get("floats").await.unwrap().unwrap();
    let bits = |v: &[f64]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&back.value), bits(&entry.value));
}
