// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use scoutrs::domain::repositories::artifact_repository::{
    Artifact, ArtifactError, ArtifactRepository,
};
use scoutrs::domain::services::semantic::{EmbeddingError, EmbeddingProvider};
use scoutrs::engines::traits::{EngineError, FetchEngine, FetchRequest, FetchResponse};

/// 内存页面集合构成的抓取引擎
///
/// 记录每次抓取的URL，未登记的URL返回404
pub struct StubFetchEngine {
    pages: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
}

impl StubFetchEngine {
    pub fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, html)| (url.to_string(), html.to_string()))
                .collect(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetched
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    pub fn total_fetches(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }
}

#[async_trait]
impl FetchEngine for StubFetchEngine {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        self.fetched.lock().unwrap().push(request.url.clone());

        match self.pages.get(&request.url) {
            Some(html) => Ok(FetchResponse {
                status_code: 200,
                content: html.clone(),
                content_type: "text/html; charset=utf-8".to_string(),
            }),
            None => Err(EngineError::HttpStatus(404)),
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// 收集产物的内存仓库
pub struct MemoryArtifactRepository {
    artifacts: Mutex<Vec<Artifact>>,
}

impl MemoryArtifactRepository {
    pub fn new() -> Self {
        Self {
            artifacts: Mutex::new(Vec::new()),
        }
    }

    pub fn artifacts(&self) -> Vec<Artifact> {
        self.artifacts.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.artifacts.lock().unwrap().len()
    }
}

#[async_trait]
impl ArtifactRepository for MemoryArtifactRepository {
    async fn persist(&self, artifact: &Artifact) -> Result<PathBuf, ArtifactError> {
        let mut artifacts = self.artifacts.lock().unwrap();
        artifacts.push(artifact.clone());
        Ok(PathBuf::from(format!(
            "memory://{}_{}",
            artifact.session, artifact.sequence
        )))
    }
}

/// 按关键词区分向量的确定性嵌入提供商
///
/// 包含关键词的文本映射到[1, 0]，其余映射到与其余弦相似度
/// 恰为0.3的向量，便于测试阈值边界
pub struct KeywordEmbedder {
    keyword: String,
}

impl KeywordEmbedder {
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.to_lowercase().contains(&self.keyword.to_lowercase()) {
            Ok(vec![1.0, 0.0])
        } else {
            // cos([1,0], [0.3, 0.9539392]) == 0.3
            Ok(vec![0.3, 0.953_939_2])
        }
    }

    fn name(&self) -> &'static str {
        "keyword-stub"
    }
}
