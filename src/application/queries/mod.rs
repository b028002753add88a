//! CQRS Queries - 查询定义

pub mod handlers;
mod task_queries;

pub use task_queries::*;
