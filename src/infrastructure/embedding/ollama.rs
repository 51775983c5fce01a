// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::settings::EmbeddingSettings;
use crate::domain::services::semantic::{EmbeddingError, EmbeddingProvider};

/// 默认嵌入模型
pub const DEFAULT_EMBED_MODEL: &str = "mxbai-embed-large";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    embedding: Option<Vec<f32>>,
}

/// Ollama嵌入提供商
///
/// 调用本地或远程Ollama服务的`/api/embeddings`接口
pub struct OllamaEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaEmbedder {
    /// 创建新的Ollama嵌入提供商实例
    ///
    /// # 参数
    ///
    /// * `host` - 服务地址，缺少scheme时补上http://
    /// * `model` - 嵌入模型名称
    pub fn new(host: &str, model: &str) -> Self {
        let host = if host.contains("://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: format!("{}/api/embeddings", host.trim_end_matches('/')),
            model: model.to_string(),
        }
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        Self::new(&settings.host, &settings.model)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbeddingsRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    EmbeddingError::Unavailable(e.to_string())
                } else {
                    EmbeddingError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(EmbeddingError::Unavailable(format!(
                "Ollama returned {}",
                response.status()
            )));
        }

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        match body.embedding {
            Some(embedding) if !embedding.is_empty() => {
                debug!(model = %self.model, dims = embedding.len(), "Ollama embedding generated");
                Ok(embedding)
            }
            _ => Err(EmbeddingError::InvalidResponse(
                "response missing embedding vector".to_string(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
