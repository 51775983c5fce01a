// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 提供商返回的原始搜索结果
///
/// 由具体提供商实现构造，聚合器负责过滤、评分与去重
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawSearchResult {
    pub url: String,
    pub title: String,
    pub description: String,
}

/// 聚合后的搜索结果
///
/// 聚合器返回后不可变
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub description: String,
    /// 结果域名（小写）
    pub domain: String,
    /// 粗粒度质量分（0、1或2）
    pub quality_score: u8,
    /// 提供结果的引擎名称
    pub source: String,
}

impl SearchResult {
    pub fn new(raw: RawSearchResult, domain: String, quality_score: u8, source: &str) -> Self {
        Self {
            url: raw.url,
            title: raw.title,
            description: raw.description,
            domain,
            quality_score,
            source: source.to_string(),
        }
    }
}
