// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::domain::models::search_result::RawSearchResult;
use crate::domain::search::provider::{SearchError, SearchProvider};

/// Tavily Search API地址
pub const TAVILY_SEARCH_API_URL: &str = "https://api.tavily.com/search";

const PROVIDER_RESULT_CAP: u32 = 20;

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: u32,
    include_answer: bool,
    include_raw_content: bool,
    include_images: bool,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    /// Tavily的描述字段名为content
    #[serde(default)]
    content: String,
}

/// Tavily搜索提供商
///
/// 次提供商，在主提供商失败或结果不足时兜底
pub struct TavilySearchProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl TavilySearchProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self::with_endpoint(api_key, TAVILY_SEARCH_API_URL, timeout)
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
impl SearchProvider for TavilySearchProvider {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<RawSearchResult>, SearchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SearchError::Unavailable("Tavily API key not configured".to_string()))?;

        let request = TavilyRequest {
            api_key,
            query,
            search_depth: "basic",
            max_results: max_results.min(PROVIDER_RESULT_CAP),
            include_answer: false,
            include_raw_content: false,
            include_images: false,
        };

        info!("Searching with Tavily API: '{}' (max {} results)", query, max_results);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
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
            return Err(SearchError::AuthError(format!("Tavily rejected key: {}", status)));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(SearchError::ProviderError(format!(
                "Tavily Search error: {}",
                status
            )));
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ProviderError(e.to_string()))?;

        let results = body
            .results
            .into_iter()
            .map(|r| RawSearchResult {
                url: r.url,
                title: r.title,
                description: r.content,
            })
            .collect();

        Ok(results)
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn name(&self) -> &'static str {
        "tavily"
    }
}
