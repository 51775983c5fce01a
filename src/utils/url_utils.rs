// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 判断字符串是否为合法的http(s) URL
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            (parsed.scheme() == "http" || parsed.scheme() == "https")
                && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}

/// 规范化URL，用于访问去重和跨提供商去重
///
/// 去掉fragment，丢弃末尾斜杠，scheme与host小写。
/// 无法解析的输入原样返回，由调用方决定如何处理。
pub fn normalize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            let mut normalized = parsed.to_string();
            while normalized.ends_with('/') && parsed.path() != "/" {
                normalized.pop();
            }
            // A bare host keeps the root slash that Url::to_string adds
            if parsed.path() == "/" && parsed.query().is_none() {
                if let Some(stripped) = normalized.strip_suffix('/') {
                    normalized = stripped.to_string();
                }
            }
            normalized
        }
        Err(_) => url.to_string(),
    }
}

/// 提取URL中的域名
pub fn get_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.to_lowercase()))
}
