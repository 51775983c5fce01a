// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::search_result::RawSearchResult;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchError {
    #[error("Search provider error: {0}")]
    ProviderError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Authentication failed: {0}")]
    AuthError(String),
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("Timeout")]
    Timeout,
    #[error("Search unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<crate::utils::validators::ValidationError> for SearchError {
    fn from(err: crate::utils::validators::ValidationError) -> Self {
        SearchError::InvalidParameter(err.to_string())
    }
}

/// 搜索提供商特质
///
/// 聚合器持有按优先级排列的实现列表，依次尝试直到成功
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// 执行搜索查询
    async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<RawSearchResult>, SearchError>;

    /// 提供商是否已配置可用（例如具备API密钥）
    fn is_available(&self) -> bool;

    /// 提供商名称
    fn name(&self) -> &'static str;
}
