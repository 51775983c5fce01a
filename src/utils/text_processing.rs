// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 生成安全的文件名
///
/// 替换文件系统不允许的字符，折叠连续下划线并限制长度
///
/// # 参数
///
/// * `name` - 原始名称
/// * `max_length` - 最大长度（字符数）
///
/// # 返回值
///
/// 返回可安全用于文件名的字符串
pub fn safe_filename(name: &str, max_length: usize) -> String {
    const UNSAFE: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

    let mut safe = String::with_capacity(name.len());
    let mut last_was_underscore = false;
    for c in name.chars() {
        let mapped = if UNSAFE.contains(&c) || c.is_whitespace() {
            '_'
        } else {
            c
        };
        if mapped == '_' {
            if last_was_underscore {
                continue;
            }
            last_was_underscore = true;
        } else {
            last_was_underscore = false;
        }
        safe.push(mapped);
    }

    let mut safe: String = safe.chars().take(max_length).collect();
    while safe.ends_with(['.', '_']) {
        safe.pop();
    }

    if safe.is_empty() {
        "unnamed".to_string()
    } else {
        safe
    }
}

/// 按字符数截断文本，保证UTF-8边界安全
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
