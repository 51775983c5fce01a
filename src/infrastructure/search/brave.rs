// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use crate::domain::models::search_result::RawSearchResult;
use crate::domain::search::provider::{SearchError, SearchProvider};

/// Brave Search API地址
pub const BRAVE_SEARCH_API_URL: &str = "https://api.search.brave.com/res/v1/web/search";

/// 单个提供商允许的最大结果数
const PROVIDER_RESULT_CAP: u32 = 20;

#[derive(Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWebSection>,
}

#[derive(Deserialize)]
struct BraveWebSection {
    #[serde(default)]
    results: Vec<BraveWebResult>,
}

#[derive(Deserialize)]
struct BraveWebResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

/// Brave搜索提供商
///
/// 主提供商，覆盖面较好，凭据缺失时报告不可用
pub struct BraveSearchProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl BraveSearchProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self::with_endpoint(api_key, BRAVE_SEARCH_API_URL, timeout)
    }

    /// 指定API地址创建实例（测试时指向mock服务）
    pub fn with_endpoint(api_key: Option<String>, endpoint: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl SearchProvider for BraveSearchProvider {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<RawSearchResult>, SearchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SearchError::Unavailable("Brave API key not configured".to_string()))?;

        let count = max_results.min(PROVIDER_RESULT_CAP).to_string();
        let params = [
            ("q", query),
            ("count", count.as_str()),
            ("safesearch", "moderate"),
            ("search_lang", "en"),
            ("country", "US"),
            ("text_decorations", "false"),
            ("spellcheck", "true"),
        ];

        info!("Searching with Brave API: '{}' (max {} results)", query, max_results);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .header("X-Subscription-Token", api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout
                } else {
                    SearchError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SearchError::AuthError(format!("Brave rejected key: {}", status)));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(SearchError::ProviderError(format!(
                "Brave Search error: {}",
                status
            )));
        }

        let body: BraveResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ProviderError(e.to_string()))?;

        let results = body
            .web
            .map(|section| section.results)
            .unwrap_or_default()
            .into_iter()
            .map(|r| RawSearchResult {
                url: r.url,
                title: r.title,
                description: r.description,
            })
            .collect();

        Ok(results)
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn name(&self) -> &'static str {
        "brave"
    }
}
