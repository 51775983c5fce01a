// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// 产物持久化错误类型
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// 待持久化的产物
#[derive(Debug, Clone)]
pub struct Artifact {
    /// 会话短名
    pub session: String,
    /// 会话内单调递增序号
    pub sequence: u64,
    /// 来源（URL或文件路径）
    pub source: String,
    /// 标题
    pub title: String,
    /// 元数据摘要
    pub metadata_summary: String,
    /// 正文内容
    pub content: String,
    /// 主题相关性评分（启用主题过滤时有值）
    pub topic_relevance: Option<f64>,
}

/// 产物仓库特质
///
/// 爬取核心只通过该窄接口写出文档，
/// 格式化与落盘细节由实现负责
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    /// 持久化一个产物，返回写入路径
    async fn persist(&self, artifact: &Artifact) -> Result<PathBuf, ArtifactError>;
}
