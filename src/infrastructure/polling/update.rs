//! 发布给订阅者的轮询结果

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::machine::PollPhase;
use crate::domain::{TaskId, TaskStatus};

/// 重试耗尽后发布的错误
///
/// 属于暂时性错误，轮询在下个周期继续
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// 网络错误、超时、非 2xx 响应
    #[error("Transport error after {attempts} attempts: {message}")]
    Transport { attempts: u32, message: String },

    /// 响应体无法识别
    #[error("Malformed response after {attempts} attempts: {message}")]
    Malformed { attempts: u32, message: String },
}

impl PollError {
    pub fn attempts(&self) -> u32 {
        match self {
            PollError::Transport { attempts, .. } | PollError::Malformed { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// 单次轮询结果
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Status(TaskStatus),
    Error(PollError),
}

/// 发布的更新
#[derive(Debug, Clone, PartialEq)]
pub struct PollUpdate {
    pub task_id: TaskId,
    pub phase: PollPhase,
    pub outcome: PollOutcome,
    pub received_at: DateTime<Utc>,
}

impl PollUpdate {
    pub fn status(&self) -> Option<&TaskStatus> {
        match &self.outcome {
            PollOutcome::Status(status) => Some(status),
            PollOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PollError> {
        match &self.outcome {
            PollOutcome::Status(_) => None,
            PollOutcome::Error(error) => Some(error),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase == PollPhase::Terminal
    }
}
