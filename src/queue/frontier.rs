// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashSet;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::domain::models::crawl::CrawlTask;

/// 空闲工作器的轮询间隔，兜底错过的唤醒
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 爬取边界队列
///
/// 会话内所有工作器共享的任务队列。
/// `pending`统计已入队但尚未处理完的任务：
/// 队列为空且pending为零时会话结束。
pub struct Frontier {
    queue: Mutex<VecDeque<CrawlTask>>,
    pending: AtomicUsize,
    notify: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            pending: AtomicUsize::new(0),
            notify: Notify::new(),
        }
    }

    /// 入队任务并唤醒一个空闲工作器
    pub fn push(&self, task: CrawlTask) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.queue.lock().push_back(task);
        self.notify.notify_one();
    }

    /// 出队任务
    pub fn pop(&self) -> Option<CrawlTask> {
        self.queue.lock().pop_front()
    }

    /// 标记一个任务处理完成
    ///
    /// 必须在任务的所有子任务入队之后调用，
    /// 否则pending可能短暂归零导致会话提前结束
    pub fn task_done(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Last task finished, wake everyone up so they can exit
            self.notify.notify_waiters();
        }
    }

    /// 队列为空且没有在途任务
    pub fn is_idle(&self) -> bool {
        self.pending.load(Ordering::SeqCst) == 0
    }

    /// 当前队列长度
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 等待新任务或会话结束信号
    pub async fn wait_for_work(&self) {
        tokio::select! {
            _ = self.notify.notified() => {}
            _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {}
        }
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

/// 访问去重集合
///
/// 记录本会话内已被工作器取走的规范化来源。
/// 无论多少任务引用同一URL，每个URL每会话至多被抓取一次。
pub struct VisitedSet {
    inner: DashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self {
            inner: DashSet::new(),
        }
    }

    /// 原子地检查并插入
    ///
    /// # 返回值
    ///
    /// 首次见到该来源时返回true，已存在时返回false
    pub fn insert(&self, source: &str) -> bool {
        self.inner.insert(source.to_string())
    }

    pub fn contains(&self, source: &str) -> bool {
        self.inner.contains(source)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for VisitedSet {
    fn default() -> Self {
        Self::new()
    }
}
