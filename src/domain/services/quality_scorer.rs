// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::search_result::RawSearchResult;

/// 质量分上限
pub const MAX_QUALITY_SCORE: u8 = 2;

/// 搜索结果质量评分器特质
///
/// 三档质量分（0/1/2）是可替换的策略，聚合器只依赖
/// “分数一致地按信号质量排序”这一契约
pub trait QualityScorer: Send + Sync {
    /// 为单条结果打分，返回0、1或2
    fn score(&self, result: &RawSearchResult, domain: &str) -> u8;
}

/// 默认启发式评分器
///
/// 权威域名命中加一分，标题与描述齐全加一分
pub struct HeuristicQualityScorer;

/// 加分的权威域名或URL片段
const QUALITY_DOMAINS: &[&str] = &[
    "github.com",
    "stackoverflow.com",
    "medium.com",
    "docs.python.org",
    "developer.mozilla.org",
    ".edu",
    ".gov",
    "readthedocs.io",
    "tutorial",
    "guide",
    "documentation",
];

impl QualityScorer for HeuristicQualityScorer {
    fn score(&self, result: &RawSearchResult, domain: &str) -> u8 {
        let mut score = 0u8;

        let url_lower = result.url.to_lowercase();
        if QUALITY_DOMAINS
            .iter()
            .any(|d| domain.contains(d) || url_lower.contains(d))
        {
            score += 1;
        }

        if !result.title.trim().is_empty() && !result.description.trim().is_empty() {
            score += 1;
        }

        score.min(MAX_QUALITY_SCORE)
    }
}
