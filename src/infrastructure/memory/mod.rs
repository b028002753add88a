//! Memory Layer - In-Memory State Management
//!
//! 进程内的活动任务句柄存储，用于测试和临时会话

mod task_handle_store;

pub use task_handle_store::InMemoryTaskHandleStore;
