//! Task Handle Store Port - 活动任务句柄持久化
//!
//! 保存最近一次提交的任务 ID，进程重启后仍可恢复状态查看

use thiserror::Error;

use crate::domain::TaskId;

/// 活动任务句柄的固定存储键
pub const ACTIVE_TASK_KEY: &str = "streamscale_active_task";

/// Store 错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid stored handle: {0}")]
    InvalidHandle(String),
}

/// Task Handle Store Port
///
/// 同一时间只有一个活动句柄，新的上传会覆盖旧值。
/// 句柄不会按时间过期，只会被替换或显式清除。
pub trait TaskHandleStorePort: Send + Sync {
    /// 保存任务 ID（覆盖旧值）
    fn set(&self, task_id: &TaskId) -> Result<(), StoreError>;

    /// 读取最近保存的任务 ID
    fn get(&self) -> Result<Option<TaskId>, StoreError>;

    /// 清除句柄
    fn clear(&self) -> Result<(), StoreError>;
}
