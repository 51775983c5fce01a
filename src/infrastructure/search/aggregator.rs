// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::join_all;
use metrics::counter;
use strsim::jaro_winkler;
use tokio::sync::{OnceCell, Semaphore};
use tracing::{info, warn};

use crate::domain::models::search_result::{RawSearchResult, SearchResult};
use crate::domain::search::provider::{SearchError, SearchProvider};
use crate::domain::services::quality_scorer::QualityScorer;
use crate::infrastructure::cache::FileCache;
use crate::infrastructure::search::presets;
use crate::utils::{url_utils, validators};

/// 标题相似度超过该值的结果视为重复
const TITLE_DEDUP_THRESHOLD: f64 = 0.92;

/// 低质量域名，出现即丢弃
const SKIP_DOMAINS: &[&str] = &[
    "pinterest.com",
    "youtube.com",
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "reddit.com",
    "tiktok.com",
    "snapchat.com",
];

type FlightCell = Arc<OnceCell<Result<Vec<SearchResult>, SearchError>>>;

/// 批量搜索中的单个查询
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BatchQuery {
    pub query: String,
    #[serde(default)]
    pub max_results: Option<u32>,
    #[serde(default)]
    pub domain_filter: Option<String>,
}

/// 批量搜索结果报告
///
/// 部分成功是正常结果，单个查询失败不会使整个批次失败
#[derive(Debug)]
pub struct BatchSearchReport {
    pub total_queries: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: HashMap<String, Result<Vec<SearchResult>, SearchError>>,
}

/// 搜索聚合器
///
/// 按优先级依次尝试提供商，对结果去重、评分并应用域名预设。
/// 相同逻辑请求共享缓存键；并发的相同请求做single-flight去重，
/// 只发出一次底层提供商调用。
pub struct SearchAggregator {
    providers: Vec<Arc<dyn SearchProvider>>,
    scorer: Arc<dyn QualityScorer>,
    cache: Option<Arc<FileCache>>,
    inflight: DashMap<String, FlightCell>,
    batch_concurrency: usize,
}

impl SearchAggregator {
    /// 创建新的搜索聚合器实例
    ///
    /// # 参数
    ///
    /// * `providers` - 按优先级排列的提供商列表
    /// * `scorer` - 质量评分策略
    /// * `cache` - 结果缓存（None时不缓存）
    /// * `batch_concurrency` - 批量搜索的并发上限
    pub fn new(
        providers: Vec<Arc<dyn SearchProvider>>,
        scorer: Arc<dyn QualityScorer>,
        cache: Option<Arc<FileCache>>,
        batch_concurrency: usize,
    ) -> Self {
        Self {
            providers,
            scorer,
            cache,
            inflight: DashMap::new(),
            batch_concurrency: batch_concurrency.max(1),
        }
    }

    /// 是否存在已配置的提供商
    pub fn is_available(&self) -> bool {
        self.providers.iter().any(|p| p.is_available())
    }

    /// 执行搜索，不抓取结果页面内容
    ///
    /// # 参数
    ///
    /// * `query` - 查询文本
    /// * `max_results` - 返回结果上限
    /// * `domain_filter` - 域名预设名称（可选）
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<SearchResult>)` - 去重且按质量分排序的结果
    /// * `Err(SearchError)` - 参数非法、无可用提供商或全部提供商失败
    pub async fn search_only(
        &self,
        query: &str,
        max_results: u32,
        domain_filter: Option<&str>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        validators::validate_search_params(query, max_results)?;
        let preset_domains = match domain_filter {
            Some(name) => Some(presets::preset(name).ok_or_else(|| {
                SearchError::InvalidParameter(format!("unknown domain preset '{}'", name))
            })?),
            None => None,
        };

        if !self.is_available() {
            return Err(SearchError::Unavailable(
                "no search provider configured".to_string(),
            ));
        }

        let cache_key = FileCache::cache_key(&[
            "search",
            query,
            &max_results.to_string(),
            domain_filter.unwrap_or(""),
        ]);

        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get::<Vec<SearchResult>>(&cache_key).await {
                info!("Cache hit for query: '{}'", query);
                return Ok(cached);
            }
        }

        counter!("scoutrs_searches_total").increment(1);

        // Single-flight: concurrent identical requests share one provider call
        let cell: FlightCell = {
            let entry = self
                .inflight
                .entry(cache_key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()));
            entry.value().clone()
        };

        let result = cell
            .get_or_init(|| async {
                let outcome = self
                    .search_with_fallback(query, max_results, preset_domains.map(|v| v.as_slice()))
                    .await;

                if let (Ok(results), Some(cache)) = (&outcome, &self.cache) {
                    if let Err(e) = cache.put(&cache_key, results, None).await {
                        warn!("Failed to cache search results: {}", e);
                    }
                }
                outcome
            })
            .await
            .clone();

        // Drop the registry entry so later identical requests start a fresh flight
        self.inflight
            .remove_if(&cache_key, |_, value| Arc::ptr_eq(value, &cell));

        result
    }

    /// 带兜底的提供商调用
    ///
    /// 主提供商失败或结果不足时继续尝试次提供商
    async fn search_with_fallback(
        &self,
        query: &str,
        max_results: u32,
        preset_domains: Option<&[&str]>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        // Over-fetch so preset filtering still has enough candidates
        let fetch_limit = max_results.saturating_mul(2);

        let mut collected: Vec<SearchResult> = Vec::new();
        let mut last_error: Option<SearchError> = None;
        let mut any_success = false;

        for provider in &self.providers {
            if !provider.is_available() {
                continue;
            }
            if collected.len() >= fetch_limit as usize {
                break;
            }

            match provider.search(query, fetch_limit).await {
                Ok(raw_results) => {
                    any_success = true;
                    let scored = self.filter_and_score(raw_results, provider.name());
                    let added = merge_deduplicated(&mut collected, scored);
                    info!(
                        "Provider {} contributed {} new results for '{}'",
                        provider.name(),
                        added,
                        query
                    );
                }
                Err(e) => {
                    warn!("Provider {} failed, trying next: {}", provider.name(), e);
                    last_error = Some(e);
                }
            }
        }

        if !any_success {
            return Err(last_error.unwrap_or_else(|| {
                SearchError::Unavailable("no search provider configured".to_string())
            }));
        }

        if let Some(domains) = preset_domains {
            collected.retain(|r| presets::matches_preset(domains, &r.url, &r.domain));
        }

        // Stable sort keeps provider order within equal quality
        collected.sort_by(|a, b| b.quality_score.cmp(&a.quality_score));
        collected.truncate(max_results as usize);

        Ok(collected)
    }

    /// 过滤无效与低质量结果并评分
    fn filter_and_score(
        &self,
        raw_results: Vec<RawSearchResult>,
        provider_name: &str,
    ) -> Vec<SearchResult> {
        let mut results = Vec::with_capacity(raw_results.len());

        for raw in raw_results {
            if raw.url.is_empty() || raw.title.is_empty() || !url_utils::is_valid_url(&raw.url) {
                continue;
            }

            let domain = match url_utils::get_domain(&raw.url) {
                Some(d) => d,
                None => continue,
            };

            if SKIP_DOMAINS.iter().any(|skip| domain.contains(skip)) {
                continue;
            }

            let quality_score = self.scorer.score(&raw, &domain);
            results.push(SearchResult::new(raw, domain, quality_score, provider_name));
        }

        results
    }

    /// 批量搜索
    ///
    /// 以受限并发执行全部查询；单个查询失败只记录，不影响其余查询
    ///
    /// # 返回值
    ///
    /// 返回带成功/失败计数和逐查询结果的报告，本调用自身从不失败
    pub async fn batch_search(&self, queries: Vec<BatchQuery>) -> BatchSearchReport {
        let total_queries = queries.len();
        let semaphore = Arc::new(Semaphore::new(self.batch_concurrency));

        let futures = queries.into_iter().map(|q| {
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore.acquire().await;
                let outcome = self
                    .search_only(
                        &q.query,
                        q.max_results.unwrap_or(10),
                        q.domain_filter.as_deref(),
                    )
                    .await;
                (q.query, outcome)
            }
        });

        let mut results = HashMap::with_capacity(total_queries);
        let mut successful = 0usize;
        let mut failed = 0usize;

        for (query, outcome) in join_all(futures).await {
            match &outcome {
                Ok(_) => successful += 1,
                Err(e) => {
                    warn!("Batch query '{}' failed: {}", query, e);
                    failed += 1;
                }
            }
            results.insert(query, outcome);
        }

        BatchSearchReport {
            total_queries,
            successful,
            failed,
            results,
        }
    }
}

/// 合并结果并去重
///
/// 先按规范化URL判重，再用Jaro-Winkler折叠近似重复的标题。
/// 返回实际加入的数量。
fn merge_deduplicated(collected: &mut Vec<SearchResult>, incoming: Vec<SearchResult>) -> usize {
    let mut added = 0usize;

    for result in incoming {
        let normalized = url_utils::normalize_url(&result.url);
        let duplicate = collected.iter().any(|existing| {
            url_utils::normalize_url(&existing.url) == normalized
                || jaro_winkler(&existing.title, &result.title) > TITLE_DEDUP_THRESHOLD
        });

        if !duplicate {
            collected.push(result);
            added += 1;
        }
    }

    added
}

#[cfg(test)]
#[path = "aggregator_test.rs"]
mod tests;
