//! Scripted Status Client - 用于测试的状态客户端
//!
//! 按脚本顺序返回预设响应，不实际访问后端。
//! 脚本耗尽后重复最后一条响应。

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::{download_url, DEFAULT_BASE_URL};
use crate::application::ports::{ApiError, TaskStatusApiPort};
use crate::domain::{Resolution, TaskId};

/// 一条预设响应
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// 成功返回的原始 JSON
    Body(Value),
    /// 请求失败
    Failure(ApiError),
}

/// Scripted Status Client
pub struct ScriptedStatusClient {
    script: Mutex<VecDeque<ScriptedResponse>>,
    last: Mutex<Option<ScriptedResponse>>,
    /// 每次 fetch 的调用时刻（tokio 时钟，可在暂停时间的测试中精确比较）
    fetches: Mutex<Vec<(TaskId, Instant)>>,
    cancelled: Mutex<Vec<TaskId>>,
    uploads: AtomicUsize,
    upload_id: Option<String>,
    latency: Duration,
    base_url: String,
}

impl ScriptedStatusClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            fetches: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            uploads: AtomicUsize::new(0),
            upload_id: None,
            latency: Duration::ZERO,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// 以给定响应序列创建
    pub fn with_responses(responses: impl IntoIterator<Item = ScriptedResponse>) -> Self {
        let client = Self::new();
        for response in responses {
            client.push(response);
        }
        client
    }

    /// 固定上传返回的任务 ID（默认随机 UUID）
    pub fn with_upload_id(mut self, task_id: impl Into<String>) -> Self {
        self.upload_id = Some(task_id.into());
        self
    }

    /// 模拟网络延迟
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push(&self, response: ScriptedResponse) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
    }

    pub fn push_body(&self, body: Value) {
        self.push(ScriptedResponse::Body(body));
    }

    pub fn push_failure(&self, error: ApiError) {
        self.push(ScriptedResponse::Failure(error));
    }

    /// 已发出的 fetch 次数
    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// 每次 fetch 的调用时刻
    pub fn fetch_instants(&self) -> Vec<Instant> {
        self.fetches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }

    /// 相邻两次 fetch 的间隔
    pub fn fetch_gaps(&self) -> Vec<Duration> {
        self.fetch_instants()
            .windows(2)
            .map(|pair| pair[1].duration_since(pair[0]))
            .collect()
    }

    /// 被 fetch 过的任务 ID（按调用顺序）
    pub fn fetched_ids(&self) -> Vec<TaskId> {
        self.fetches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::Relaxed)
    }

    pub fn cancelled(&self) -> Vec<TaskId> {
        self.cancelled.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn next_response(&self) -> ScriptedResponse {
        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        match next {
            Some(response) => {
                *last = Some(response.clone());
                response
            }
            None => last
                .clone()
                .unwrap_or_else(|| ScriptedResponse::Body(json!({ "state": "PENDING" }))),
        }
    }
}

impl Default for ScriptedStatusClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStatusApiPort for ScriptedStatusClient {
    async fn fetch_status(&self, task_id: &TaskId) -> Result<Value, ApiError> {
        self.fetches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((task_id.clone(), Instant::now()));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.next_response() {
            ScriptedResponse::Body(body) => Ok(body),
            ScriptedResponse::Failure(error) => Err(error),
        }
    }

    async fn upload_video(&self, file: &Path) -> Result<TaskId, ApiError> {
        self.uploads.fetch_add(1, Ordering::Relaxed);
        let id = self
            .upload_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        tracing::debug!(
            file = %file.display(),
            task_id = %id,
            "ScriptedStatusClient: upload accepted"
        );
        TaskId::new(id).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn cancel_task(&self, task_id: &TaskId) -> Result<(), ApiError> {
        self.cancelled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(task_id.clone());
        Ok(())
    }

    fn download_url(&self, task_id: &TaskId, resolution: Option<&Resolution>) -> String {
        download_url(&self.base_url, task_id, resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_order_and_repeat_last() {
        let client = ScriptedStatusClient::with_responses([
            ScriptedResponse::Failure(ApiError::Timeout),
            ScriptedResponse::Body(json!({ "state": "SUCCESS" })),
        ]);
        let id = TaskId::new("t1").unwrap();

        assert!(matches!(client.fetch_status(&id).await, Err(ApiError::Timeout)));
        assert_eq!(client.fetch_status(&id).await.unwrap()["state"], "SUCCESS");
        assert_eq!(client.fetch_status(&id).await.unwrap()["state"], "SUCCESS");
        assert_eq!(client.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_script_reports_pending() {
        let client = ScriptedStatusClient::new();
        let body = client.fetch_status(&TaskId::new("t1").unwrap()).await.unwrap();
        assert_eq!(body["state"], "PENDING");
    }

    #[tokio::test]
    async fn test_random_upload_id() {
        let client = ScriptedStatusClient::new();
        let id = client.upload_video(Path::new("movie.mp4")).await.unwrap();
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
    }
}
