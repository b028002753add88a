//! Task Status API Port - 转码后端 HTTP 接口抽象
//!
//! 定义客户端与后端交互的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::domain::{Resolution, TaskId};

/// API 错误
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Io error: {0}")]
    IoError(String),
}

impl ApiError {
    /// 任务不存在（后端返回 404）
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::HttpError { status: 404, .. })
    }
}

/// Task Status API Port
///
/// 后端接口:
/// - `GET  /api/v1/tasks/{task_id}/status`
/// - `POST /api/v1/upload`
/// - `POST /api/v1/tasks/{task_id}/cancel`
/// - `GET  /api/v1/download/{task_id}/{resolution}`
/// - `GET  /api/v1/tasks/{task_id}/download`
#[async_trait]
pub trait TaskStatusApiPort: Send + Sync {
    /// 获取原始状态响应
    ///
    /// 返回未经规范化的 JSON，规范化由调用方负责
    async fn fetch_status(&self, task_id: &TaskId) -> Result<Value, ApiError>;

    /// 上传视频文件，返回后端分配的任务 ID
    async fn upload_video(&self, file: &Path) -> Result<TaskId, ApiError>;

    /// 请求后端取消任务
    async fn cancel_task(&self, task_id: &TaskId) -> Result<(), ApiError>;

    /// 下载地址；`resolution` 为 None 时返回整体打包下载地址
    fn download_url(&self, task_id: &TaskId, resolution: Option<&Resolution>) -> String;
}
