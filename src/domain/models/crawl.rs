// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// 爬取任务
///
/// 入队时创建，由某个工作器消费恰好一次，创建后不可变。
/// 重新入队总是创建新任务而不是修改旧任务。
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlTask {
    /// 目标来源（URL或本地文件路径，已规范化）
    pub source: String,
    /// 当前深度（种子为0）
    pub depth: u32,
    /// 发现该来源的父来源
    pub parent: Option<String>,
}

impl CrawlTask {
    /// 创建种子任务
    pub fn seed(source: String) -> Self {
        Self {
            source,
            depth: 0,
            parent: None,
        }
    }

    /// 创建子任务，深度加一
    pub fn child(&self, source: String) -> Self {
        Self {
            source,
            depth: self.depth + 1,
            parent: Some(self.source.clone()),
        }
    }
}

/// 爬取会话
///
/// 单次爬取调用的生命周期内有效，提供产物命名唯一性。
/// 不跨调用持久化。
#[derive(Debug)]
pub struct CrawlSession {
    /// 会话标识
    pub session_id: Uuid,
    seq: AtomicU64,
}

impl CrawlSession {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            seq: AtomicU64::new(0),
        }
    }

    /// 获取下一个产物序号（单调递增）
    pub fn next_sequence(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    /// 会话短名，用于产物文件名前缀
    pub fn short_name(&self) -> String {
        let id = self.session_id.simple().to_string();
        format!("scout_{}", &id[..8])
    }
}

impl Default for CrawlSession {
    fn default() -> Self {
        Self::new()
    }
}

/// 爬取会话统计结果
///
/// 会话总是返回完整的结构化统计，部分失败不会使其缺字段。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlReport {
    /// 已输出的产物数量
    pub artifacts_emitted: u64,
    /// 成功处理的来源数量
    pub sources_processed: u64,
    /// 跳过的来源数量（重复、失败、低相关性、近期已缓存）
    pub sources_skipped: u64,
}

/// 会话内跨工作器共享的计数器
///
/// 只通过原子操作更新，聚合时不存在数据竞争
#[derive(Debug, Default)]
pub struct CrawlStats {
    artifacts_emitted: AtomicU64,
    sources_processed: AtomicU64,
    sources_skipped: AtomicU64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_artifact(&self) {
        self.artifacts_emitted.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_processed(&self) {
        self.sources_processed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_skipped(&self) {
        self.sources_skipped.fetch_add(1, Ordering::SeqCst);
    }

    /// 生成会话报告快照
    pub fn snapshot(&self) -> CrawlReport {
        CrawlReport {
            artifacts_emitted: self.artifacts_emitted.load(Ordering::SeqCst),
            sources_processed: self.sources_processed.load(Ordering::SeqCst),
            sources_skipped: self.sources_skipped.load(Ordering::SeqCst),
        }
    }
}
