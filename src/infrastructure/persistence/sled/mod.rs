//! Sled Persistence - 嵌入式 KV 存储

mod task_handle_store;

pub use task_handle_store::{SledHandleStoreConfig, SledTaskHandleStore};
