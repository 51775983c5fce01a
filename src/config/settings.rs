// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含爬取、缓存、搜索和嵌入服务等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 爬取配置
    pub crawler: CrawlerSettings,
    /// 缓存配置
    pub cache: CacheSettings,
    /// 搜索配置
    pub search: SearchSettings,
    /// 嵌入服务配置
    pub embedding: EmbeddingSettings,
}

/// 爬取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSettings {
    /// 工作器数量
    pub worker_count: usize,
    /// 最大爬取深度（-1 表示不限制）
    pub max_depth: i32,
    /// 主题过滤（可选）
    pub topic: Option<String>,
    /// 主题相关性阈值（0.0-1.0）
    pub topic_threshold: f64,
    /// 链接相关性阈值（0.0-1.0，大于0.8时启用逐链接嵌入过滤）
    pub link_threshold: f64,
    /// 单个请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 结果输出目录
    pub output_dir: String,
}

/// 缓存配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// 缓存目录
    pub dir: String,
    /// 缓存有效期（分钟）
    pub ttl_minutes: i64,
    /// 缓存最大文件数
    pub max_entries: usize,
}

/// 搜索配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// Brave Search API 密钥
    pub brave_api_key: Option<String>,
    /// Tavily Search API 密钥
    pub tavily_api_key: Option<String>,
    /// 单次搜索请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 批量搜索并发上限
    pub batch_concurrency: usize,
}

/// 嵌入服务配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSettings {
    /// Ollama 服务地址
    pub host: String,
    /// 嵌入模型名称
    pub model: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default crawler settings
            .set_default("crawler.worker_count", 5)?
            .set_default("crawler.max_depth", 1)?
            .set_default("crawler.topic_threshold", 0.5)?
            .set_default("crawler.link_threshold", 0.6)?
            .set_default("crawler.request_timeout_secs", 30)?
            .set_default("crawler.output_dir", "./scraped_content")?
            // Default cache settings
            .set_default("cache.dir", "./search_cache")?
            .set_default("cache.ttl_minutes", 90)?
            .set_default("cache.max_entries", 1000)?
            // Default search settings
            .set_default("search.request_timeout_secs", 30)?
            .set_default("search.batch_concurrency", 4)?
            // Default embedding settings
            .set_default("embedding.host", "http://localhost:11434")?
            .set_default("embedding.model", "mxbai-embed-large")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SCOUTRS").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
