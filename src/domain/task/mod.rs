//! Task Context - 转码任务状态

mod aggregator;
mod errors;
mod normalizer;
mod status;
mod value_objects;

pub use aggregator::{aggregate, Aggregate};
pub use errors::NormalizeError;
pub use normalizer::{normalize, normalize_bytes};
pub use status::{SubTaskState, SubTaskStatus, TaskState, TaskStatus};
pub use value_objects::{Resolution, TaskId};
