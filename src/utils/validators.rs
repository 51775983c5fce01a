// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;
use url::Url;

/// 验证错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// URL无效
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// 参数无效
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// 验证URL
///
/// 只接受带有host的http(s) URL
///
/// # 参数
///
/// * `url` - URL字符串
///
/// # 返回值
///
/// * `Ok(())` - URL有效
/// * `Err(ValidationError)` - URL无效
pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    let parsed = Url::parse(url).map_err(|_| ValidationError::InvalidUrl(url.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::InvalidUrl(url.to_string()));
    }

    if parsed.host_str().is_none() {
        return Err(ValidationError::InvalidUrl(url.to_string()));
    }

    Ok(())
}

/// 验证搜索参数
///
/// 在任何网络或缓存操作之前拒绝非法输入
pub fn validate_search_params(query: &str, max_results: u32) -> Result<(), ValidationError> {
    if query.trim().is_empty() {
        return Err(ValidationError::InvalidParameter(
            "query must not be empty".to_string(),
        ));
    }
    if max_results == 0 {
        return Err(ValidationError::InvalidParameter(
            "max_results must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// 验证爬取参数
pub fn validate_crawl_params(
    worker_count: usize,
    topic_threshold: f64,
    link_threshold: f64,
) -> Result<(), ValidationError> {
    if worker_count == 0 {
        return Err(ValidationError::InvalidParameter(
            "worker_count must be greater than 0".to_string(),
        ));
    }
    for (name, value) in [
        ("topic_threshold", topic_threshold),
        ("link_threshold", link_threshold),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::InvalidParameter(format!(
                "{} must be within [0.0, 1.0], got {}",
                name, value
            )));
        }
    }
    Ok(())
}
