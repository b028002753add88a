//! Task Command Handlers

use std::sync::Arc;

use crate::application::commands::task_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{TaskHandleStorePort, TaskStatusApiPort};

/// SubmitUpload Handler - 上传视频并保存活动句柄
pub struct SubmitUploadHandler {
    api: Arc<dyn TaskStatusApiPort>,
    store: Arc<dyn TaskHandleStorePort>,
}

impl SubmitUploadHandler {
    pub fn new(api: Arc<dyn TaskStatusApiPort>, store: Arc<dyn TaskHandleStorePort>) -> Self {
        Self { api, store }
    }

    pub async fn handle(
        &self,
        cmd: SubmitUploadCommand,
    ) -> Result<SubmitUploadResponse, ApplicationError> {
        if !cmd.file.is_file() {
            return Err(ApplicationError::validation(format!(
                "Not a file: {}",
                cmd.file.display()
            )));
        }

        tracing::info!(file = %cmd.file.display(), "Uploading video");
        let task_id = self.api.upload_video(&cmd.file).await?;

        // 每次成功上传只写一次，覆盖旧句柄
        self.store.set(&task_id)?;

        tracing::info!(task_id = %task_id, "Upload accepted, active task recorded");
        Ok(SubmitUploadResponse { task_id })
    }
}

/// StartOver Handler - 清除活动句柄
pub struct StartOverHandler {
    store: Arc<dyn TaskHandleStorePort>,
}

impl StartOverHandler {
    pub fn new(store: Arc<dyn TaskHandleStorePort>) -> Self {
        Self { store }
    }

    pub fn handle(&self, _cmd: StartOverCommand) -> Result<(), ApplicationError> {
        self.store.clear()?;
        tracing::info!("Active task handle cleared");
        Ok(())
    }
}

/// CancelTask Handler - 请求后端取消任务
pub struct CancelTaskHandler {
    api: Arc<dyn TaskStatusApiPort>,
    store: Arc<dyn TaskHandleStorePort>,
}

impl CancelTaskHandler {
    pub fn new(api: Arc<dyn TaskStatusApiPort>, store: Arc<dyn TaskHandleStorePort>) -> Self {
        Self { api, store }
    }

    pub async fn handle(
        &self,
        cmd: CancelTaskCommand,
    ) -> Result<CancelTaskResponse, ApplicationError> {
        let task_id = match cmd.task_id {
            Some(id) => id,
            None => self.store.get()?.ok_or(ApplicationError::NoActiveTask)?,
        };

        self.api.cancel_task(&task_id).await?;
        tracing::info!(task_id = %task_id, "Task cancellation requested");

        Ok(CancelTaskResponse { task_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskId;
    use crate::infrastructure::adapters::ScriptedStatusClient;
    use crate::infrastructure::memory::InMemoryTaskHandleStore;
    use std::io::Write;

    #[tokio::test]
    async fn test_upload_overwrites_active_handle() {
        let api = Arc::new(ScriptedStatusClient::new().with_upload_id("abc123"));
        let store = Arc::new(InMemoryTaskHandleStore::new());
        store.set(&TaskId::new("older").unwrap()).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not really a video").unwrap();

        let handler = SubmitUploadHandler::new(api.clone(), store.clone());
        let response = handler
            .handle(SubmitUploadCommand {
                file: file.path().to_path_buf(),
            })
            .await
            .unwrap();

        assert_eq!(response.task_id.as_str(), "abc123");
        assert_eq!(store.get().unwrap(), Some(TaskId::new("abc123").unwrap()));
        assert_eq!(api.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_upload_of_missing_file_keeps_handle() {
        let api = Arc::new(ScriptedStatusClient::new());
        let store = Arc::new(InMemoryTaskHandleStore::new());
        store.set(&TaskId::new("older").unwrap()).unwrap();

        let handler = SubmitUploadHandler::new(api.clone(), store.clone());
        let result = handler
            .handle(SubmitUploadCommand {
                file: "/definitely/not/here.mp4".into(),
            })
            .await;

        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
        assert_eq!(store.get().unwrap(), Some(TaskId::new("older").unwrap()));
        assert_eq!(api.upload_count(), 0);
    }

    #[test]
    fn test_start_over_clears_handle() {
        let store = Arc::new(InMemoryTaskHandleStore::new());
        store.set(&TaskId::new("abc123").unwrap()).unwrap();

        StartOverHandler::new(store.clone())
            .handle(StartOverCommand)
            .unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_cancel_falls_back_to_active_task() {
        let api = Arc::new(ScriptedStatusClient::new());
        let store = Arc::new(InMemoryTaskHandleStore::new());
        let handler = CancelTaskHandler::new(api.clone(), store.clone());

        let result = handler.handle(CancelTaskCommand::default()).await;
        assert!(matches!(result, Err(ApplicationError::NoActiveTask)));

        store.set(&TaskId::new("abc123").unwrap()).unwrap();
        let response = handler.handle(CancelTaskCommand::default()).await.unwrap();
        assert_eq!(response.task_id.as_str(), "abc123");
        assert_eq!(api.cancelled(), vec![TaskId::new("abc123").unwrap()]);
    }
}
