// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::repositories::artifact_repository::{Artifact, ArtifactError, ArtifactRepository};
use crate::utils::text_processing::safe_filename;

/// 标题在文件名中的最大长度
const TITLE_FILENAME_LIMIT: usize = 50;

/// 文件系统产物仓库
///
/// 把接受的页面写成markdown文档，文件名由会话名、
/// 序号、安全化标题和来源哈希组成，保证唯一
pub struct FsArtifactRepository {
    output_dir: PathBuf,
}

impl FsArtifactRepository {
    /// 创建新的文件系统产物仓库实例
    ///
    /// # 参数
    ///
    /// * `output_dir` - 输出目录（不存在时创建）
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }
}

#[async_trait]
impl ArtifactRepository for FsArtifactRepository {
    /// 持久化产物为markdown文档
    ///
    /// # 返回值
    ///
    /// 返回写入的文件路径
    async fn persist(&self, artifact: &Artifact) -> Result<PathBuf, ArtifactError> {
        let title_part = if artifact.title.is_empty() {
            "untitled".to_string()
        } else {
            safe_filename(&artifact.title, TITLE_FILENAME_LIMIT)
        };

        let mut hasher = Sha256::new();
        hasher.update(artifact.source.as_bytes());
        let source_hash = hex::encode(hasher.finalize());

        let filename = format!(
            "{}_{:04}_{}_{}.md",
            artifact.session,
            artifact.sequence,
            title_part,
            &source_hash[..8]
        );
        let path = self.output_dir.join(filename);

        let mut document = String::new();
        document.push_str(&format!(
            "# {}\n\n",
            if artifact.title.is_empty() {
                "Untitled"
            } else {
                &artifact.title
            }
        ));
        document.push_str("## Metadata\n\n");
        document.push_str(&format!("- **Source:** {}\n", artifact.source));
        document.push_str(&format!(
            "- **Scraped:** {}\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        ));
        if !artifact.metadata_summary.is_empty() {
            document.push_str(&format!("- **Type:** {}\n", artifact.metadata_summary));
        }
        if let Some(relevance) = artifact.topic_relevance {
            document.push_str(&format!("- **Topic Relevance:** {:.3}\n", relevance));
        }
        document.push_str("\n## Content\n\n");
        document.push_str(&artifact.content);

        tokio::fs::write(&path, document).await?;
        debug!("Saved markdown artifact: {}", path.display());

        Ok(path)
    }
}
