//! HTTP Status Client - 调用转码后端 HTTP 服务
//!
//! 实现 TaskStatusApiPort trait
//!
//! 后端 API:
//! GET  {base}/api/v1/tasks/{task_id}/status   -> JSON 状态（结构随版本变化）
//! POST {base}/api/v1/upload (multipart: file) -> {"task_id": "..."}
//! POST {base}/api/v1/tasks/{task_id}/cancel

use async_trait::async_trait;
use reqwest::{multipart, Body, Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;

use super::{cancel_url, download_url, status_url, upload_url, DEFAULT_BASE_URL};
use crate::application::ports::{ApiError, TaskStatusApiPort};
use crate::domain::{Resolution, TaskId};

/// 上传响应体
#[derive(Debug, Deserialize)]
struct UploadHttpResponse {
    task_id: String,
}

/// HTTP 状态客户端配置
#[derive(Debug, Clone)]
pub struct HttpStatusClientConfig {
    /// 后端基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpStatusClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpStatusClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 状态客户端
pub struct HttpStatusClient {
    client: Client,
    config: HttpStatusClientConfig,
}

impl HttpStatusClient {
    /// 创建新的 HTTP 客户端
    pub fn new(config: HttpStatusClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 使用默认配置创建客户端
    pub fn with_default_config() -> Result<Self, ApiError> {
        Self::new(HttpStatusClientConfig::default())
    }

    fn map_send_error(e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_connect() {
            ApiError::NetworkError(format!("Cannot connect to backend: {}", e))
        } else {
            ApiError::NetworkError(e.to_string())
        }
    }

    /// 非 2xx 响应转换为 HttpError
    async fn ensure_success(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %body, "Backend returned error status");
        Err(ApiError::HttpError {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl TaskStatusApiPort for HttpStatusClient {
    async fn fetch_status(&self, task_id: &TaskId) -> Result<Value, ApiError> {
        let url = status_url(&self.config.base_url, task_id);
        tracing::debug!(url = %url, "Fetching task status");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::ensure_success(response).await?;

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to read body: {}", e)))?;

        serde_json::from_slice(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("Body is not JSON: {}", e)))
    }

    async fn upload_video(&self, file: &Path) -> Result<TaskId, ApiError> {
        let io_error = |e: std::io::Error| ApiError::IoError(format!("{}: {}", file.display(), e));
        let handle = tokio::fs::File::open(file).await.map_err(io_error)?;
        let size = handle.metadata().await.map_err(io_error)?.len();
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        // 按块流式上传
        let body = Body::wrap_stream(ReaderStream::new(handle));
        let form = multipart::Form::new().part(
            "file",
            multipart::Part::stream_with_length(body, size).file_name(file_name),
        );

        tracing::debug!(file = %file.display(), size = size, "Sending upload request");

        let response = self
            .client
            .post(upload_url(&self.config.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::ensure_success(response).await?;

        let body: UploadHttpResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Invalid upload response: {}", e)))?;

        TaskId::new(body.task_id).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn cancel_task(&self, task_id: &TaskId) -> Result<(), ApiError> {
        let response = self
            .client
            .post(cancel_url(&self.config.base_url, task_id))
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    fn download_url(&self, task_id: &TaskId, resolution: Option<&Resolution>) -> String {
        download_url(&self.config.base_url, task_id, resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpStatusClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_config_builder_trims_trailing_slash() {
        let config = HttpStatusClientConfig::new("http://example.com:9000/").with_timeout(5);
        assert_eq!(config.base_url, "http://example.com:9000");
        assert_eq!(config.timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_io_error() {
        let client = HttpStatusClient::new(HttpStatusClientConfig::new("http://127.0.0.1:9"))
            .unwrap();
        let dir = tempfile::tempdir().unwrap();

        let result = client.upload_video(&dir.path().join("missing.mp4")).await;
        assert!(matches!(result, Err(ApiError::IoError(msg)) if msg.contains("missing.mp4")));
    }

    #[test]
    fn test_urls() {
        let client = HttpStatusClient::with_default_config().unwrap();
        let task_id = TaskId::new("abc123").unwrap();
        assert_eq!(
            status_url(&client.config.base_url, &task_id),
            "http://localhost:8000/api/v1/tasks/abc123/status"
        );
        assert_eq!(
            client.download_url(&task_id, Some(&Resolution::new("720"))),
            "http://localhost:8000/api/v1/download/abc123/720"
        );
        assert_eq!(
            client.download_url(&task_id, None),
            "http://localhost:8000/api/v1/tasks/abc123/download"
        );

        let odd = TaskId::new("a/b?c").unwrap();
        assert_eq!(
            status_url(&client.config.base_url, &odd),
            "http://localhost:8000/api/v1/tasks/a%2Fb%3Fc/status"
        );
    }
}
