// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::{Html, Selector};
use url::Url;

use crate::utils::url_utils;

/// 页面中发现的出站链接
#[derive(Debug, Clone, PartialEq)]
pub struct LinkInfo {
    /// 绝对URL
    pub url: String,
    /// 锚文本（可能为空）
    pub anchor: String,
}

/// 提取HTML页面标题
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// 提取页面正文文本
///
/// 去掉script和style内容，合并空白。结果用于主题相关性评分和存档。
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_selector = match Selector::parse("body") {
        Ok(s) => s,
        Err(_) => return String::new(),
    };
    let skip_selector = Selector::parse("script, style, noscript").ok();

    let root = document.select(&body_selector).next();
    let text = match root {
        Some(body) => {
            let skipped: Vec<String> = skip_selector
                .as_ref()
                .map(|sel| {
                    body.select(sel)
                        .map(|e| e.text().collect::<String>())
                        .collect()
                })
                .unwrap_or_default();

            let mut collected = body.text().collect::<Vec<_>>().join(" ");
            for chunk in skipped {
                if !chunk.is_empty() {
                    collected = collected.replace(&chunk, " ");
                }
            }
            collected
        }
        None => String::new(),
    };

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 从HTML中提取出站链接
///
/// 相对链接基于`base_url`解析为绝对URL，只保留http(s)链接。
/// 同一页面内的重复目标只返回一次。
///
/// # 参数
///
/// * `html` - 原始HTML
/// * `base_url` - 页面自身的URL
///
/// # 返回值
///
/// 返回链接信息列表，解析失败时返回空列表
pub fn extract_links(html: &str, base_url: &str) -> Vec<LinkInfo> {
    let base = match Url::parse(base_url) {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };

    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let href = match element.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }

        let resolved = match url_utils::resolve_url(&base, href) {
            Ok(u) => u,
            Err(_) => continue,
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }

        let normalized = url_utils::normalize_url(resolved.as_str());
        if !seen.insert(normalized.clone()) {
            continue;
        }

        let anchor = element
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        links.push(LinkInfo {
            url: normalized,
            anchor,
        });
    }

    links
}
