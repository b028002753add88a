//! Task Queries - 任务相关查询

use crate::domain::{Resolution, TaskId, TaskStatus};

/// 解析要查看的任务
///
/// 优先使用显式给出的任务 ID，否则恢复最近保存的活动句柄
#[derive(Debug, Clone, Default)]
pub struct ResolveActiveTask {
    pub explicit: Option<TaskId>,
}

/// 任务 ID 的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSource {
    Explicit,
    Stored,
}

/// 解析结果
#[derive(Debug, Clone)]
pub struct ResolvedTask {
    pub task_id: TaskId,
    pub source: TaskSource,
}

/// 获取已完成分辨率的下载地址
#[derive(Debug, Clone)]
pub struct GetDownloadLinks {
    pub task_id: TaskId,
    pub status: TaskStatus,
}

/// 单个下载地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    /// None 表示整体打包下载
    pub resolution: Option<Resolution>,
    pub url: String,
}
