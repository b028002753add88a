//! StreamScale - 分布式视频转码客户端核心
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Task Context: 规范状态模型、状态规范化器、子任务聚合器
//!
//! 应用层 (application/):
//! - Ports: 端口定义（TaskStatusApi, TaskHandleStore）
//! - Commands: 上传、重新开始、取消
//! - Queries: 解析活动任务、下载地址
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: HTTP 状态客户端、脚本化测试客户端
//! - Memory / Persistence: 活动任务句柄存储（内存 / Sled）
//! - Polling: 共享轮询循环、退避重试、状态机

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
