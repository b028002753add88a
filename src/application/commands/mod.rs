//! CQRS Commands - 命令定义

pub mod handlers;
mod task_commands;

pub use task_commands::*;
