// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 默认缓存有效期（分钟）
pub const DEFAULT_TTL_MINUTES: i64 = 90;
/// 默认缓存最大文件数
pub const DEFAULT_MAX_ENTRIES: usize = 1000;
/// 超出容量时一次性淘汰的比例
const EVICTION_FRACTION: f64 = 0.2;

/// 缓存错误类型
#[derive(Error, Debug)]
pub enum CacheError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 磁盘上的缓存记录
///
/// 格式对调用方不透明，只有get/put语义是契约
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    key: String,
    created_at: DateTime<Utc>,
    ttl_minutes: i64,
    payload: serde_json::Value,
}

impl CacheRecord {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.created_at + Duration::minutes(self.ttl_minutes)
    }
}

/// 文件缓存
///
/// 内容寻址、带TTL和容量上限的键值存储。
/// 跨会话与跨进程共享：写入采用临时文件加原子改名，
/// 并发读写不会观察到写了一半的记录。
pub struct FileCache {
    dir: PathBuf,
    default_ttl_minutes: i64,
    max_entries: usize,
}

impl FileCache {
    /// 创建新的文件缓存实例
    ///
    /// # 参数
    ///
    /// * `dir` - 缓存目录（不存在时创建）
    /// * `ttl_minutes` - 默认有效期
    /// * `max_entries` - 文件数上限
    pub fn new(
        dir: impl Into<PathBuf>,
        ttl_minutes: i64,
        max_entries: usize,
    ) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            default_ttl_minutes: ttl_minutes,
            max_entries,
        })
    }

    /// 使用默认TTL与容量创建
    pub fn with_defaults(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        Self::new(dir, DEFAULT_TTL_MINUTES, DEFAULT_MAX_ENTRIES)
    }

    /// 根据逻辑请求的各部分生成确定性缓存键
    pub fn cache_key(parts: &[&str]) -> String {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }

    /// 读取缓存值
    ///
    /// 过期条目等同于不存在；无法解码的条目作为miss处理并顺手删除，
    /// 解码错误从不暴露给调用方。
    ///
    /// # 返回值
    ///
    /// * `Some(T)` - 命中
    /// * `None` - 未命中（不存在、已过期或已损坏）
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.entry_path(key);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                counter!("scoutrs_cache_misses_total").increment(1);
                return None;
            }
            Err(e) => {
                warn!(key, "Cache read error: {}", e);
                counter!("scoutrs_cache_misses_total").increment(1);
                return None;
            }
        };

        let record: CacheRecord = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(e) => {
                // Self-healing: corrupt entries are deleted, never surfaced
                warn!(key, "Removing corrupt cache entry: {}", e);
                let _ = tokio::fs::remove_file(&path).await;
                counter!("scoutrs_cache_corrupt_total").increment(1);
                counter!("scoutrs_cache_misses_total").increment(1);
                return None;
            }
        };

        if record.is_expired_at(Utc::now()) {
            debug!(key, "Cache entry expired");
            counter!("scoutrs_cache_misses_total").increment(1);
            return None;
        }

        match serde_json::from_value(record.payload) {
            Ok(value) => {
                debug!(key, "Cache hit");
                counter!("scoutrs_cache_hits_total").increment(1);
                Some(value)
            }
            Err(e) => {
                warn!(key, "Removing cache entry with mismatched payload: {}", e);
                let _ = tokio::fs::remove_file(&path).await;
                counter!("scoutrs_cache_misses_total").increment(1);
                None
            }
        }
    }

    /// 写入缓存值
    ///
    /// 同键并发写采用last-writer-wins，写入经由临时文件原子替换
    ///
    /// # 参数
    ///
    /// * `key` - 缓存键
    /// * `payload` - 可序列化的负载
    /// * `ttl_minutes` - 有效期（None时使用默认值）
    pub async fn put<T: Serialize>(
        &self,
        key: &str,
        payload: &T,
        ttl_minutes: Option<i64>,
    ) -> Result<(), CacheError> {
        let record = CacheRecord {
            key: key.to_string(),
            created_at: Utc::now(),
            ttl_minutes: ttl_minutes.unwrap_or(self.default_ttl_minutes),
            payload: serde_json::to_value(payload)?,
        };

        let bytes = serde_json::to_vec(&record)?;
        let tmp_path = self
            .dir
            .join(format!(".{}.{}.tmp", key, Uuid::new_v4().simple()));

        tokio::fs::write(&tmp_path, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, self.entry_path(key)).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        counter!("scoutrs_cache_stores_total").increment(1);
        Ok(())
    }

    /// 清理过期条目
    ///
    /// 与get/put的热路径解耦，作为显式维护操作运行，
    /// 读写路径不需要为每次调用付出目录扫描成本
    ///
    /// # 返回值
    ///
    /// 返回删除的条目数量
    pub async fn sweep_expired(&self) -> Result<usize, CacheError> {
        let now = Utc::now();
        let mut removed = 0usize;

        for path in self.entry_paths().await? {
            let expired = match tokio::fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<CacheRecord>(&bytes) {
                    Ok(record) => record.is_expired_at(now),
                    // Unreadable entries go out with the sweep too
                    Err(_) => true,
                },
                Err(_) => continue,
            };

            if expired && tokio::fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Swept {} expired cache entries", removed);
        }
        Ok(removed)
    }

    /// 执行容量上限
    ///
    /// 超出上限时按创建时间一次性淘汰最旧的20%，
    /// 而不是逐条淘汰，以摊薄清理扫描的成本
    ///
    /// # 返回值
    ///
    /// 返回删除的条目数量
    pub async fn enforce_size_cap(&self) -> Result<usize, CacheError> {
        let mut entries: Vec<(DateTime<Utc>, PathBuf)> = Vec::new();

        for path in self.entry_paths().await? {
            match tokio::fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<CacheRecord>(&bytes) {
                    Ok(record) => entries.push((record.created_at, path)),
                    Err(_) => {
                        let _ = tokio::fs::remove_file(&path).await;
                    }
                },
                Err(_) => continue,
            }
        }

        if entries.len() <= self.max_entries {
            return Ok(0);
        }

        entries.sort_by_key(|(created_at, _)| *created_at);
        let to_remove = (entries.len() as f64 * EVICTION_FRACTION) as usize;

        let mut removed = 0usize;
        for (_, path) in entries.into_iter().take(to_remove) {
            if tokio::fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }

        counter!("scoutrs_cache_evictions_total").increment(removed as u64);
        info!(
            "Evicted {} oldest cache entries to stay under {} files",
            removed, self.max_entries
        );
        Ok(removed)
    }

    /// 当前存储的条目数量
    pub async fn len(&self) -> Result<usize, CacheError> {
        Ok(self.entry_paths().await?.len())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    async fn entry_paths(&self) -> Result<Vec<PathBuf>, CacheError> {
        let mut paths = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

impl std::fmt::Debug for FileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCache")
            .field("dir", &self.dir)
            .field("default_ttl_minutes", &self.default_ttl_minutes)
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

/// 写一条指定创建时间的记录，测试过期与淘汰路径时使用
#[cfg(test)]
fn write_record_at(
    dir: &std::path::Path,
    key: &str,
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
    ttl_minutes: i64,
) {
    let record = CacheRecord {
        key: key.to_string(),
        created_at,
        ttl_minutes,
        payload,
    };
    std::fs::write(
        dir.join(format!("{}.json", key)),
        serde_json::to_vec(&record).unwrap(),
    )
    .unwrap();
}
