// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::models::crawl::{CrawlSession, CrawlStats, CrawlTask};
use crate::domain::repositories::artifact_repository::{Artifact, ArtifactRepository};
use crate::domain::services::semantic::{RelevanceSignal, SemanticAnalyzer};
use crate::engines::traits::{FetchEngine, FetchRequest};
use crate::infrastructure::cache::FileCache;
use crate::queue::{Frontier, VisitedSet};
use crate::utils::page;
use crate::utils::text_processing::truncate_chars;
use crate::utils::url_utils;
use crate::workers::manager::CrawlOptions;

/// 内容相关性评分的最大输入长度（字符）
const CONTENT_SCORE_CHARS: usize = 2000;
/// 元数据中父来源的最大长度
const PARENT_SUMMARY_CHARS: usize = 50;
/// 逐链接过滤的启用阈值，超过才为每个候选链接计算嵌入
const LINK_FILTER_GATE: f64 = 0.8;

/// 已抓取来源的缓存记录，用于跨会话去重
#[derive(Debug, Serialize, Deserialize)]
struct FetchRecord {
    source: String,
    title: Option<String>,
    content_chars: usize,
}

/// 爬取工作器
///
/// 从边界队列拉取任务：去重、抓取、可选的相关性过滤、
/// 产出产物并把发现的链接作为子任务入队。
/// 单个任务的失败只记录计数，从不中断会话。
pub struct CrawlWorker {
    worker_id: Uuid,
    engine: Arc<dyn FetchEngine>,
    artifacts: Arc<dyn ArtifactRepository>,
    cache: Option<Arc<FileCache>>,
    semantic: Option<Arc<SemanticAnalyzer>>,
    session: Arc<CrawlSession>,
    visited: Arc<VisitedSet>,
    stats: Arc<CrawlStats>,
    options: Arc<CrawlOptions>,
}

impl CrawlWorker {
    /// 创建新的爬取工作器实例
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: Arc<dyn FetchEngine>,
        artifacts: Arc<dyn ArtifactRepository>,
        cache: Option<Arc<FileCache>>,
        semantic: Option<Arc<SemanticAnalyzer>>,
        session: Arc<CrawlSession>,
        visited: Arc<VisitedSet>,
        stats: Arc<CrawlStats>,
        options: Arc<CrawlOptions>,
    ) -> Self {
        Self {
            worker_id: Uuid::new_v4(),
            engine,
            artifacts,
            cache,
            semantic,
            session,
            visited,
            stats,
            options,
        }
    }

    /// 运行工作器循环
    ///
    /// 队列为空且所有在途任务完成时退出
    pub async fn run(&self, frontier: Arc<Frontier>) {
        debug!("Crawl worker {} started", self.worker_id);

        loop {
            match frontier.pop() {
                Some(task) => {
                    self.process_task(&task, &frontier).await;
                    // Children are enqueued before the task counts as done,
                    // so pending never drops to zero with work still coming
                    frontier.task_done();
                }
                None => {
                    if frontier.is_idle() {
                        break;
                    }
                    frontier.wait_for_work().await;
                }
            }
        }

        debug!("Crawl worker {} finished", self.worker_id);
    }

    /// 处理单个任务
    async fn process_task(&self, task: &CrawlTask, frontier: &Frontier) {
        // Cycle safety: at most one fetch per normalized source per session
        if !self.visited.insert(&task.source) {
            debug!("Duplicate task for {} dropped", task.source);
            self.stats.record_skipped();
            return;
        }

        info!(
            "Processing [depth:{}] {} (origin: {})",
            task.depth,
            task.source,
            task.parent.as_deref().unwrap_or("initial")
        );

        if is_web_source(&task.source) {
            self.process_web_source(task, frontier).await;
        } else {
            self.process_local_file(task).await;
        }
    }

    async fn process_web_source(&self, task: &CrawlTask, frontier: &Frontier) {
        // Cross-session dedup: recently fetched sources are not refetched
        let fetch_key = FileCache::cache_key(&["fetch", &task.source]);
        if let Some(cache) = &self.cache {
            if cache.get::<FetchRecord>(&fetch_key).await.is_some() {
                info!("Source {} already processed recently, skipping", task.source);
                self.stats.record_skipped();
                return;
            }
        }

        let request = FetchRequest::new(&task.source, self.options.request_timeout);
        let response = match self.engine.fetch(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to fetch {}: {}", task.source, e);
                self.stats.record_skipped();
                return;
            }
        };

        let is_html = response.content_type.contains("text/html");
        let (title, text) = if is_html {
            (
                page::extract_title(&response.content),
                page::extract_text(&response.content),
            )
        } else {
            (None, response.content.clone())
        };

        if let Some(cache) = &self.cache {
            let record = FetchRecord {
                source: task.source.clone(),
                title: title.clone(),
                content_chars: text.chars().count(),
            };
            if let Err(e) = cache.put(&fetch_key, &record, None).await {
                warn!("Failed to cache fetch record for {}: {}", task.source, e);
            }
        }

        let signal = self.score_content(&text).await;
        let relevance = match signal {
            Some(RelevanceSignal::Scored(score)) => {
                info!("Topic relevance for {}: {:.4}", task.source, score);
                Some(score)
            }
            _ => None,
        };

        let accepted = match signal {
            Some(signal) => signal.passes(self.options.topic_threshold),
            None => true,
        };

        if accepted {
            self.emit_artifact(task, title, &text, relevance, "HTML page")
                .await;
            self.stats.record_processed();
        } else {
            info!(
                "Content relevance below threshold {:.2}, discarding artifact for {}",
                self.options.topic_threshold, task.source
            );
            self.stats.record_skipped();
        }

        // Relevance is a content gate, not a traversal gate: links are
        // inspected even when the artifact was discarded
        if is_html && self.depth_allows_children(task.depth) {
            self.extract_and_enqueue_links(&response.content, task, frontier)
                .await;
        }
    }

    async fn process_local_file(&self, task: &CrawlTask) {
        let content = match tokio::fs::read_to_string(&task.source).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read local file {}: {}", task.source, e);
                self.stats.record_skipped();
                return;
            }
        };

        let path = std::path::Path::new(&task.source);
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string());
        let kind = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| format!("{} document", ext.to_uppercase()))
            .unwrap_or_else(|| "File".to_string());

        let signal = self.score_content(&content).await;
        let relevance = match signal {
            Some(RelevanceSignal::Scored(score)) => Some(score),
            _ => None,
        };
        let accepted = match signal {
            Some(signal) => signal.passes(self.options.topic_threshold),
            None => true,
        };

        if accepted {
            self.emit_artifact(task, title, &content, relevance, &kind)
                .await;
            self.stats.record_processed();
        } else {
            self.stats.record_skipped();
        }
        // Local files never yield links
    }

    /// 对内容做主题相关性评分
    ///
    /// 未启用主题过滤或内容为空时返回None（不评分）
    async fn score_content(&self, text: &str) -> Option<RelevanceSignal> {
        let topic = self.options.topic.as_deref()?;
        let semantic = self.semantic.as_ref()?;
        if text.trim().is_empty() {
            return None;
        }
        Some(
            semantic
                .score(topic, truncate_chars(text, CONTENT_SCORE_CHARS))
                .await,
        )
    }

    async fn emit_artifact(
        &self,
        task: &CrawlTask,
        title: Option<String>,
        content: &str,
        relevance: Option<f64>,
        kind: &str,
    ) {
        let mut metadata_summary = format!(
            "crawled {}, {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            kind
        );
        if let Some(parent) = &task.parent {
            metadata_summary.push_str(&format!(
                ", found via {}",
                truncate_chars(parent, PARENT_SUMMARY_CHARS)
            ));
        }

        let artifact = Artifact {
            session: self.session.short_name(),
            sequence: self.session.next_sequence(),
            source: task.source.clone(),
            title: title.unwrap_or_else(|| task.source.clone()),
            metadata_summary,
            content: content.to_string(),
            topic_relevance: relevance,
        };

        match self.artifacts.persist(&artifact).await {
            Ok(path) => {
                debug!("Emitted artifact {}", path.display());
                self.stats.record_artifact();
            }
            Err(e) => {
                warn!("Failed to persist artifact for {}: {}", task.source, e);
            }
        }
    }

    fn depth_allows_children(&self, depth: u32) -> bool {
        self.options.max_depth == -1 || i64::from(depth) < i64::from(self.options.max_depth)
    }

    /// 提取链接并将通过过滤的链接入队
    ///
    /// 默认快速模式不做任何嵌入计算；只有link_threshold超过0.8
    /// 且主题过滤可用时才逐链接评分
    async fn extract_and_enqueue_links(
        &self,
        html: &str,
        task: &CrawlTask,
        frontier: &Frontier,
    ) {
        let links = page::extract_links(html, &task.source);
        if links.is_empty() {
            return;
        }
        info!("Discovered {} links on {}", links.len(), task.source);

        let advanced_filtering = self.options.link_threshold > LINK_FILTER_GATE
            && self.options.topic.is_some()
            && self.semantic.is_some();
        if advanced_filtering {
            info!(
                "Advanced link filtering enabled (threshold: {})",
                self.options.link_threshold
            );
        }

        let mut enqueued = 0usize;
        for link in links {
            if !url_utils::is_valid_url(&link.url) {
                continue;
            }

            if advanced_filtering && !link.anchor.is_empty() {
                if let (Some(topic), Some(semantic)) =
                    (self.options.topic.as_deref(), self.semantic.as_ref())
                {
                    let signal = semantic.score(topic, &link.anchor).await;
                    // Links without a verdict pass: an outage degrades
                    // precision, never availability
                    if !signal.passes(self.options.link_threshold) {
                        continue;
                    }
                }
            }

            frontier.push(task.child(link.url));
            enqueued += 1;
        }

        if enqueued > 0 {
            info!("Enqueued {} links from {}", enqueued, task.source);
        }
    }
}

/// 判断来源是URL还是本地文件路径
pub fn is_web_source(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
