//! Domain Layer - 领域层
//!
//! 转码任务状态上下文:
//! - 值对象: TaskId, Resolution
//! - 规范状态模型: TaskState, SubTaskState, TaskStatus
//! - 状态规范化器与子任务聚合器（纯函数）

pub mod task;

pub use task::{
    aggregate, normalize, normalize_bytes, Aggregate, NormalizeError, Resolution, SubTaskState,
    SubTaskStatus, TaskId, TaskState, TaskStatus,
};
