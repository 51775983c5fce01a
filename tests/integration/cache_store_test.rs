// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scoutrs::infrastructure::cache::FileCache;
use tempfile::TempDir;

#[tokio::test]
async fn test_size_cap_on_overfilled_store() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path(), 90, 1000).unwrap();

    for i in 0..1050u32 {
        cache
            .put(&FileCache::cache_key(&["entry", &i.to_string()]), &i, None)
            .await
            .unwrap();
    }
    assert_eq!(cache.len().await.unwrap(), 1050);

    let removed = cache.enforce_size_cap().await.unwrap();

    // Oldest ~20% of 1050 entries evicted in a single pass
    assert_eq!(removed, 210);
    assert!(cache.len().await.unwrap() <= 840);
}

#[tokio::test]
async fn test_ttl_zero_expires_immediately() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::with_defaults(dir.path()).unwrap();

    cache.put("transient", &"value", Some(0)).await.unwrap();

    // now >= created_at + 0 minutes, so the entry is logically absent
    let value: Option<String> = cache.get("transient").await;
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_store_survives_concurrent_use_across_instances() {
    let dir = TempDir::new().unwrap();

    // Two handles over the same directory, as two processes would share it
    let writer = FileCache::with_defaults(dir.path()).unwrap();
    let reader = FileCache::with_defaults(dir.path()).unwrap();

    writer.put("shared", &42u32, None).await.unwrap();
    let value: Option<u32> = reader.get("shared").await;
    assert_eq!(value, Some(42));

    let swept = reader.sweep_expired().await.unwrap();
    assert_eq!(swept, 0);
    assert_eq!(writer.len().await.unwrap(), 1);
}
