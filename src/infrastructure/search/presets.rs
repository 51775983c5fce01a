// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// 域名预设
///
/// 预设名到允许域名后缀/片段集合的静态映射。
/// 属于配置而非会话状态。
pub static DOMAIN_PRESETS: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    HashMap::from([
        ("github", vec!["github.com"]),
        (
            "docs",
            vec![
                "readthedocs.io",
                "docs.python.org",
                "developer.mozilla.org",
                ".edu",
                ".gov",
            ],
        ),
        (
            "tutorials",
            vec!["tutorial", "guide", "howto", "learn", "course"],
        ),
        (
            "stackoverflow",
            vec!["stackoverflow.com", "stackexchange.com"],
        ),
        (
            "academic",
            vec![".edu", ".ac.uk", "arxiv.org", "scholar.google", "researchgate"],
        ),
        (
            "official",
            vec![".org", ".gov", "python.org", "nodejs.org", "reactjs.org"],
        ),
        (
            "quality",
            vec![
                "github.com",
                "stackoverflow.com",
                "medium.com",
                "docs.",
                ".edu",
                ".gov",
            ],
        ),
    ])
});

/// 查找预设
pub fn preset(name: &str) -> Option<&'static Vec<&'static str>> {
    DOMAIN_PRESETS.get(name)
}

/// 判断URL/域名是否匹配预设
///
/// 预设片段出现在域名或完整URL中即视为匹配
pub fn matches_preset(preset_domains: &[&str], url: &str, domain: &str) -> bool {
    let url_lower = url.to_lowercase();
    let domain_lower = domain.to_lowercase();
    preset_domains
        .iter()
        .any(|d| url_lower.contains(d) || domain_lower.contains(d))
}
