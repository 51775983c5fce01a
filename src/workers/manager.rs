// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::settings::{CrawlerSettings, Settings};
use crate::domain::models::crawl::{CrawlReport, CrawlSession, CrawlStats, CrawlTask};
use crate::domain::models::search_result::SearchResult;
use crate::domain::repositories::artifact_repository::ArtifactRepository;
use crate::domain::search::provider::{SearchError, SearchProvider};
use crate::domain::services::quality_scorer::HeuristicQualityScorer;
use crate::domain::services::semantic::SemanticAnalyzer;
use crate::engines::reqwest_engine::ReqwestFetchEngine;
use crate::engines::traits::FetchEngine;
use crate::infrastructure::cache::FileCache;
use crate::infrastructure::embedding::OllamaEmbedder;
use crate::infrastructure::search::aggregator::SearchAggregator;
use crate::infrastructure::search::brave::BraveSearchProvider;
use crate::infrastructure::search::tavily::TavilySearchProvider;
use crate::infrastructure::storage::FsArtifactRepository;
use crate::queue::{Frontier, VisitedSet};
use crate::utils::url_utils;
use crate::utils::validators::{self, ValidationError};
use crate::workers::crawl_worker::{is_web_source, CrawlWorker};

/// 爬取错误类型
#[derive(Error, Debug)]
pub enum CrawlError {
    /// 参数校验失败
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    /// 搜索失败
    #[error("Search error: {0}")]
    Search(#[from] SearchError),
    /// 发现模式需要搜索聚合器
    #[error("Search aggregator not configured")]
    SearchNotConfigured,
}

/// 爬取会话选项
///
/// 值在会话开始时固定，工作器之间共享只读引用
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// 最大深度（-1为不限制，0只处理种子）
    pub max_depth: i32,
    /// 工作器数量
    pub worker_count: usize,
    /// 主题过滤（可选）
    pub topic: Option<String>,
    /// 主题相关性阈值
    pub topic_threshold: f64,
    /// 链接相关性阈值，大于0.8时启用逐链接过滤
    pub link_threshold: f64,
    /// 单个请求超时时间
    pub request_timeout: Duration,
}

impl CrawlOptions {
    pub fn from_settings(settings: &CrawlerSettings) -> Self {
        Self {
            max_depth: settings.max_depth,
            worker_count: settings.worker_count,
            topic: settings.topic.clone(),
            topic_threshold: settings.topic_threshold,
            link_threshold: settings.link_threshold,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
        }
    }
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_depth: 1,
            worker_count: 5,
            topic: None,
            topic_threshold: 0.5,
            link_threshold: 0.6,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// 发现模式报告
#[derive(Debug)]
pub struct DiscoveryReport {
    /// 搜索返回的结果
    pub search_results: Vec<SearchResult>,
    /// 对结果URL的爬取统计
    pub crawl: CrawlReport,
}

/// 爬取管理器
///
/// 每次调用创建独立的会话状态（边界队列、访问集合、计数器），
/// 启动固定数量的工作器并等待边界耗尽
pub struct Crawler {
    engine: Arc<dyn FetchEngine>,
    artifacts: Arc<dyn ArtifactRepository>,
    cache: Option<Arc<FileCache>>,
    semantic: Option<Arc<SemanticAnalyzer>>,
    aggregator: Option<Arc<SearchAggregator>>,
    options: CrawlOptions,
}

impl Crawler {
    /// 创建新的爬取管理器实例
    ///
    /// # 参数
    ///
    /// * `engine` - 页面抓取引擎
    /// * `artifacts` - 产物仓库
    /// * `cache` - 跨会话抓取缓存（可选）
    /// * `semantic` - 语义分析器（可选，启用主题过滤时需要）
    /// * `aggregator` - 搜索聚合器（可选，发现模式时需要）
    /// * `options` - 会话选项
    pub fn new(
        engine: Arc<dyn FetchEngine>,
        artifacts: Arc<dyn ArtifactRepository>,
        cache: Option<Arc<FileCache>>,
        semantic: Option<Arc<SemanticAnalyzer>>,
        aggregator: Option<Arc<SearchAggregator>>,
        options: CrawlOptions,
    ) -> Self {
        Self {
            engine,
            artifacts,
            cache,
            semantic,
            aggregator,
            options,
        }
    }

    /// 根据配置装配默认组件
    ///
    /// reqwest抓取引擎、文件缓存、markdown产物仓库、Ollama语义
    /// 分析器和Brave/Tavily搜索聚合器。搜索与语义能力在凭据或
    /// 服务缺失时由各组件自行降级。
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let engine = Arc::new(ReqwestFetchEngine::new());
        let artifacts = Arc::new(FsArtifactRepository::new(&settings.crawler.output_dir)?);
        let cache = Arc::new(FileCache::new(
            &settings.cache.dir,
            settings.cache.ttl_minutes,
            settings.cache.max_entries,
        )?);
        let semantic = Arc::new(SemanticAnalyzer::new(Arc::new(
            OllamaEmbedder::from_settings(&settings.embedding),
        )));

        let search_timeout = Duration::from_secs(settings.search.request_timeout_secs);
        let providers: Vec<Arc<dyn SearchProvider>> = vec![
            Arc::new(BraveSearchProvider::new(
                settings.search.brave_api_key.clone(),
                search_timeout,
            )),
            Arc::new(TavilySearchProvider::new(
                settings.search.tavily_api_key.clone(),
                search_timeout,
            )),
        ];
        let aggregator = Arc::new(SearchAggregator::new(
            providers,
            Arc::new(HeuristicQualityScorer),
            Some(cache.clone()),
            settings.search.batch_concurrency,
        ));

        Ok(Self::new(
            engine,
            artifacts,
            Some(cache),
            Some(semantic),
            Some(aggregator),
            CrawlOptions::from_settings(&settings.crawler),
        ))
    }

    /// 执行爬取会话
    ///
    /// 种子可以是URL或本地文件路径。参数与种子在任何网络或
    /// 缓存操作之前校验。会话运行到边界耗尽为止，单任务失败
    /// 不会中断会话。
    ///
    /// # 参数
    ///
    /// * `seeds` - 种子来源列表
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlReport)` - 结构化会话统计，部分失败时同样返回
    /// * `Err(CrawlError)` - 参数校验失败
    pub async fn crawl(&self, seeds: &[String]) -> Result<CrawlReport, CrawlError> {
        validators::validate_crawl_params(
            self.options.worker_count,
            self.options.topic_threshold,
            self.options.link_threshold,
        )?;

        let mut normalized_seeds = Vec::with_capacity(seeds.len());
        for seed in seeds {
            if is_web_source(seed) {
                validators::validate_url(seed)?;
                normalized_seeds.push(url_utils::normalize_url(seed));
            } else {
                // Local paths are resolved lazily by the worker
                normalized_seeds.push(seed.clone());
            }
        }

        if normalized_seeds.is_empty() {
            warn!("Crawl invoked with no seeds");
            return Ok(CrawlReport::default());
        }

        let session = Arc::new(CrawlSession::new());
        let stats = Arc::new(CrawlStats::new());
        let visited = Arc::new(VisitedSet::new());
        let frontier = Arc::new(Frontier::new());

        info!(
            session = %session.session_id,
            seeds = normalized_seeds.len(),
            depth = self.options.max_depth,
            workers = self.options.worker_count,
            "Starting crawl session"
        );
        if let Some(topic) = &self.options.topic {
            info!("Topic filtering enabled: '{}'", topic);
        }

        for seed in normalized_seeds {
            frontier.push(CrawlTask::seed(seed));
        }

        let mut handles = Vec::with_capacity(self.options.worker_count);
        let options = Arc::new(self.options.clone());
        for _ in 0..self.options.worker_count {
            let worker = CrawlWorker::new(
                self.engine.clone(),
                self.artifacts.clone(),
                self.cache.clone(),
                self.semantic.clone(),
                session.clone(),
                visited.clone(),
                stats.clone(),
                options.clone(),
            );
            let frontier = frontier.clone();
            handles.push(tokio::spawn(async move {
                worker.run(frontier).await;
            }));
        }

        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!("Crawl worker panicked: {}", e);
            }
        }

        let report = stats.snapshot();
        info!(
            session = %session.session_id,
            processed = report.sources_processed,
            skipped = report.sources_skipped,
            artifacts = report.artifacts_emitted,
            "Crawl session finished"
        );
        Ok(report)
    }

    /// 发现模式：先搜索再爬取结果URL
    ///
    /// # 参数
    ///
    /// * `query` - 搜索查询
    /// * `max_results` - 用作种子的搜索结果上限
    ///
    /// # 返回值
    ///
    /// * `Ok(DiscoveryReport)` - 搜索结果与爬取统计
    /// * `Err(CrawlError)` - 未配置聚合器、搜索失败或校验失败
    pub async fn discover(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<DiscoveryReport, CrawlError> {
        let aggregator = self
            .aggregator
            .as_ref()
            .ok_or(CrawlError::SearchNotConfigured)?;

        info!("Discovery mode: searching for '{}'", query);
        let search_results = aggregator.search_only(query, max_results, None).await?;

        if search_results.is_empty() {
            warn!("No search results found for '{}'", query);
            return Ok(DiscoveryReport {
                search_results,
                crawl: CrawlReport::default(),
            });
        }

        let seeds: Vec<String> = search_results.iter().map(|r| r.url.clone()).collect();
        info!("Seeding crawl with {} search result URLs", seeds.len());
        let crawl = self.crawl(&seeds).await?;

        Ok(DiscoveryReport {
            search_results,
            crawl,
        })
    }
}
