//! Polling - 任务状态轮询
//!
//! 每个 TaskId 一个共享轮询循环：
//! 请求 → 规范化 → 聚合 → 发布，直到终态或最后一个订阅者离开

mod backoff;
mod machine;
mod scheduler;
mod update;

pub use backoff::Backoff;
pub use machine::{PollMachine, PollPhase};
pub use scheduler::{PollingConfig, PollingScheduler, Subscription};
pub use update::{PollError, PollOutcome, PollUpdate};
