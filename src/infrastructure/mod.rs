//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现以及后台轮询

pub mod adapters;
pub mod memory;
pub mod persistence;
pub mod polling;

pub use adapters::{HttpStatusClient, HttpStatusClientConfig, ScriptedStatusClient};
pub use memory::InMemoryTaskHandleStore;
pub use persistence::sled::SledTaskHandleStore;
pub use polling::{PollingConfig, PollingScheduler, Subscription};
