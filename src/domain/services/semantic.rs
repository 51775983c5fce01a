// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

/// 嵌入服务错误类型
#[derive(Error, Debug, Clone)]
pub enum EmbeddingError {
    /// 服务未配置或不可达
    #[error("Embedding backend unavailable: {0}")]
    Unavailable(String),
    /// 网络错误
    #[error("Network error: {0}")]
    NetworkError(String),
    /// 响应格式错误
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 嵌入提供商特质
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 为文本生成定长向量
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// 提供商名称
    fn name(&self) -> &'static str;
}

/// 相关性评分结果
///
/// `Unavailable`与`Scored(0.0)`是不同的结论：前者表示无法判断，
/// 调用方必须按“默认放行”处理；后者表示确实不相关。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelevanceSignal {
    /// 已评分，值位于[0.0, 1.0]
    Scored(f64),
    /// 过滤能力不可用
    Unavailable,
}

impl RelevanceSignal {
    /// 按阈值判断是否通过，不可用时默认放行
    pub fn passes(&self, threshold: f64) -> bool {
        match self {
            RelevanceSignal::Scored(score) => *score >= threshold,
            RelevanceSignal::Unavailable => true,
        }
    }
}

const EMBEDDING_CACHE_CAPACITY: usize = 1000;

/// 语义分析器
///
/// 基于嵌入向量的余弦相似度计算主题相关性。
/// 嵌入服务故障时只降级为`Unavailable`，从不向调用方抛错。
pub struct SemanticAnalyzer {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl SemanticAnalyzer {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        let capacity = NonZeroUsize::new(EMBEDDING_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            provider,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// 计算主题与候选文本的相关性
    ///
    /// # 参数
    ///
    /// * `topic` - 主题文本
    /// * `candidate` - 候选文本（页面内容或链接锚文本）
    ///
    /// # 返回值
    ///
    /// 返回[0,1]内的评分，或`Unavailable`
    pub async fn score(&self, topic: &str, candidate: &str) -> RelevanceSignal {
        if topic.trim().is_empty() || candidate.trim().is_empty() {
            return RelevanceSignal::Scored(0.0);
        }

        let topic_embedding = match self.embedding(topic).await {
            Some(v) => v,
            None => return RelevanceSignal::Unavailable,
        };
        let candidate_embedding = match self.embedding(candidate).await {
            Some(v) => v,
            None => return RelevanceSignal::Unavailable,
        };

        match cosine_similarity(&topic_embedding, &candidate_embedding) {
            Some(similarity) => RelevanceSignal::Scored(similarity.clamp(0.0, 1.0)),
            None => RelevanceSignal::Unavailable,
        }
    }

    /// 获取文本嵌入，带LRU缓存
    async fn embedding(&self, text: &str) -> Option<Vec<f32>> {
        let key = content_hash(text);

        if let Some(cached) = self.cache.lock().get(&key).cloned() {
            return Some(cached);
        }

        match self.provider.embed(text).await {
            Ok(vector) => {
                debug!(
                    provider = self.provider.name(),
                    dims = vector.len(),
                    "Generated embedding"
                );
                self.cache.lock().put(key, vector.clone());
                Some(vector)
            }
            Err(e) => {
                warn!(provider = self.provider.name(), "Embedding failed: {}", e);
                None
            }
        }
    }
}

/// 计算两个向量的余弦相似度
///
/// 维度不一致或零向量返回None
fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
