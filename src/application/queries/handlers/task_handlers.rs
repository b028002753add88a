//! Task Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{TaskHandleStorePort, TaskStatusApiPort};
use crate::application::queries::task_queries::*;
use crate::domain::TaskState;

/// ResolveActiveTask Handler
pub struct ResolveActiveTaskHandler {
    store: Arc<dyn TaskHandleStorePort>,
}

impl ResolveActiveTaskHandler {
    pub fn new(store: Arc<dyn TaskHandleStorePort>) -> Self {
        Self { store }
    }

    /// 没有任何可用任务 ID 时返回 `NoActiveTask`，调用方不应启动轮询
    pub fn handle(&self, query: ResolveActiveTask) -> Result<ResolvedTask, ApplicationError> {
        if let Some(task_id) = query.explicit {
            return Ok(ResolvedTask {
                task_id,
                source: TaskSource::Explicit,
            });
        }

        match self.store.get()? {
            Some(task_id) => {
                tracing::info!(task_id = %task_id, "Resuming stored active task");
                Ok(ResolvedTask {
                    task_id,
                    source: TaskSource::Stored,
                })
            }
            None => Err(ApplicationError::NoActiveTask),
        }
    }
}

/// GetDownloadLinks Handler
pub struct GetDownloadLinksHandler {
    api: Arc<dyn TaskStatusApiPort>,
}

impl GetDownloadLinksHandler {
    pub fn new(api: Arc<dyn TaskStatusApiPort>) -> Self {
        Self { api }
    }

    /// 只有 COMPLETED 的子任务才有下载地址；整体成功或部分成功时附带打包地址
    pub fn handle(&self, query: GetDownloadLinks) -> Vec<DownloadLink> {
        let mut links: Vec<DownloadLink> = query
            .status
            .completed_resolutions()
            .into_iter()
            .map(|resolution| DownloadLink {
                url: self.api.download_url(&query.task_id, Some(resolution)),
                resolution: Some(resolution.clone()),
            })
            .collect();

        if matches!(
            query.status.state,
            TaskState::Success | TaskState::PartialSuccess
        ) {
            links.push(DownloadLink {
                resolution: None,
                url: self.api.download_url(&query.task_id, None),
            });
        }

        links
    }
}
