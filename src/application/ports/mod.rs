//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod status_api;
mod task_handle_store;

pub use status_api::{ApiError, TaskStatusApiPort};
pub use task_handle_store::{StoreError, TaskHandleStorePort, ACTIVE_TASK_KEY};
