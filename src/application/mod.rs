//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TaskStatusApi、TaskHandleStore）
//! - commands: CQRS 命令及处理器（上传、重新开始、取消）
//! - queries: CQRS 查询及处理器（解析活动任务、下载地址）
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    CancelTaskCommand,
    CancelTaskResponse,
    StartOverCommand,
    SubmitUploadCommand,
    SubmitUploadResponse,
    // Handlers
    handlers::{CancelTaskHandler, StartOverHandler, SubmitUploadHandler},
};

pub use error::ApplicationError;

pub use ports::{
    // Status API
    ApiError,
    TaskStatusApiPort,
    // Task handle store
    StoreError,
    TaskHandleStorePort,
    ACTIVE_TASK_KEY,
};

pub use queries::{
    DownloadLink,
    GetDownloadLinks,
    ResolveActiveTask,
    ResolvedTask,
    TaskSource,
    // Handlers
    handlers::{GetDownloadLinksHandler, ResolveActiveTaskHandler},
};
