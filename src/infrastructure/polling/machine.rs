//! Poll State Machine
//!
//! 轮询循环的显式状态机:
//!
//! ```text
//! Idle ──begin──▶ Polling ──terminal status──▶ Terminal (吸收态)
//!                  │  ▲ └──non-terminal status──┘ (留在 Polling)
//!        retries   │  │
//!        exhausted ▼  │ begin
//!                 Error
//! ```

use serde::Serialize;

use crate::domain::TaskStatus;

/// 轮询阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    /// 尚未开始
    Idle,
    /// 正在轮询（包括两次请求之间的等待）
    Polling,
    /// 已到终态，不再发请求
    Terminal,
    /// 最近一次请求在重试耗尽后失败，下个周期继续
    Error,
}

impl PollPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollPhase::Idle => "idle",
            PollPhase::Polling => "polling",
            PollPhase::Terminal => "terminal",
            PollPhase::Error => "error",
        }
    }
}

/// 轮询状态机
#[derive(Debug, Clone)]
pub struct PollMachine {
    phase: PollPhase,
}

impl PollMachine {
    pub fn new() -> Self {
        Self {
            phase: PollPhase::Idle,
        }
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    /// 开始一次请求；终态下返回 false
    pub fn begin_fetch(&mut self) -> bool {
        match self.phase {
            PollPhase::Terminal => false,
            PollPhase::Idle | PollPhase::Polling | PollPhase::Error => {
                self.transition(PollPhase::Polling);
                true
            }
        }
    }

    /// 收到规范化状态
    pub fn on_status(&mut self, status: &TaskStatus) -> PollPhase {
        if self.phase == PollPhase::Polling && status.is_terminal() {
            self.transition(PollPhase::Terminal);
        }
        self.phase
    }

    /// 重试耗尽
    pub fn on_failure(&mut self) -> PollPhase {
        if self.phase == PollPhase::Polling {
            self.transition(PollPhase::Error);
        }
        self.phase
    }

    /// 是否继续安排下一次请求（失败不会停止轮询）
    pub fn should_continue(&self) -> bool {
        self.phase != PollPhase::Terminal
    }

    fn transition(&mut self, next: PollPhase) {
        if self.phase != next {
            tracing::trace!(from = self.phase.as_str(), to = next.as_str(), "Poll phase changed");
        }
        self.phase = next;
    }
}

impl Default for PollMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize;
    use serde_json::json;

    fn status(state: &str) -> TaskStatus {
        normalize(&json!({ "state": state })).unwrap()
    }

    #[test]
    fn test_progress_then_terminal() {
        let mut machine = PollMachine::new();
        assert_eq!(machine.phase(), PollPhase::Idle);

        assert!(machine.begin_fetch());
        assert_eq!(machine.on_status(&status("PROGRESS")), PollPhase::Polling);
        assert!(machine.should_continue());

        assert!(machine.begin_fetch());
        assert_eq!(machine.on_status(&status("COMPLETED")), PollPhase::Terminal);
        assert!(!machine.should_continue());
        assert!(!machine.begin_fetch());
    }

    #[test]
    fn test_failure_keeps_polling() {
        let mut machine = PollMachine::new();
        machine.begin_fetch();
        assert_eq!(machine.on_failure(), PollPhase::Error);
        assert!(machine.should_continue());

        assert!(machine.begin_fetch());
        assert_eq!(machine.phase(), PollPhase::Polling);
        assert_eq!(machine.on_status(&status("FAILED")), PollPhase::Terminal);
    }

    #[test]
    fn test_terminal_is_absorbing() {
        let mut machine = PollMachine::new();
        machine.begin_fetch();
        machine.on_status(&status("PARTIAL_SUCCESS"));

        assert_eq!(machine.on_failure(), PollPhase::Terminal);
        assert_eq!(machine.on_status(&status("PROGRESS")), PollPhase::Terminal);
        assert!(!machine.begin_fetch());
    }

    #[test]
    fn test_events_before_begin_are_ignored() {
        let mut machine = PollMachine::new();
        assert_eq!(machine.on_status(&status("SUCCESS")), PollPhase::Idle);
        assert_eq!(machine.on_failure(), PollPhase::Idle);
    }
}
