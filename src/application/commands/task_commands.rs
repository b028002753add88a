//! Task Commands - 任务相关命令

use std::path::PathBuf;

use crate::domain::TaskId;

/// 上传视频并记录活动任务
#[derive(Debug, Clone)]
pub struct SubmitUploadCommand {
    pub file: PathBuf,
}

/// 上传响应
#[derive(Debug, Clone)]
pub struct SubmitUploadResponse {
    pub task_id: TaskId,
}

/// 重新开始：清除活动任务句柄
#[derive(Debug, Clone, Default)]
pub struct StartOverCommand;

/// 取消任务；未指定时取消活动任务
#[derive(Debug, Clone, Default)]
pub struct CancelTaskCommand {
    pub task_id: Option<TaskId>,
}

/// 取消响应
#[derive(Debug, Clone)]
pub struct CancelTaskResponse {
    pub task_id: TaskId,
}
