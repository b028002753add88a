//! Task Context - 规范状态模型
//!
//! 后端不同版本使用两套状态词汇（SUCCESS/FAILURE 与 COMPLETED/FAILED），
//! 在这里通过显式同义词表统一为一个枚举，消费方只处理规范值。

use serde::Serialize;
use std::collections::BTreeMap;

use super::value_objects::Resolution;

/// 任务整体状态（规范值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// 已接收，等待处理
    Pending,
    /// 已开始，尚无子任务离开队列
    Started,
    /// 转码进行中
    Progress,
    /// 全部分辨率完成
    Success,
    /// 部分分辨率完成，部分失败
    PartialSuccess,
    /// 全部失败
    Failure,
}

/// 任务状态同义词表（键为规范化后的大写标签）
const TASK_STATE_SYNONYMS: &[(&str, TaskState)] = &[
    ("PENDING", TaskState::Pending),
    ("QUEUED", TaskState::Pending),
    ("UPLOADED", TaskState::Pending),
    ("RECEIVED", TaskState::Pending),
    ("RETRY", TaskState::Pending),
    ("STARTED", TaskState::Started),
    ("PROGRESS", TaskState::Progress),
    ("RUNNING", TaskState::Progress),
    ("PROCESSING", TaskState::Progress),
    ("IN_PROGRESS", TaskState::Progress),
    ("SUCCESS", TaskState::Success),
    ("COMPLETED", TaskState::Success),
    ("COMPLETE", TaskState::Success),
    ("DONE", TaskState::Success),
    ("PARTIAL_SUCCESS", TaskState::PartialSuccess),
    ("PARTIAL", TaskState::PartialSuccess),
    ("FAILURE", TaskState::Failure),
    ("FAILED", TaskState::Failure),
    ("ERROR", TaskState::Failure),
];

/// 子任务状态同义词表
const SUB_TASK_STATE_SYNONYMS: &[(&str, SubTaskState)] = &[
    ("QUEUED", SubTaskState::Queued),
    ("PENDING", SubTaskState::Queued),
    ("RUNNING", SubTaskState::Running),
    ("STARTED", SubTaskState::Running),
    ("PROGRESS", SubTaskState::Running),
    ("PROCESSING", SubTaskState::Running),
    ("COMPLETED", SubTaskState::Completed),
    ("SUCCESS", SubTaskState::Completed),
    ("DONE", SubTaskState::Completed),
    ("FAILED", SubTaskState::Failed),
    ("FAILURE", SubTaskState::Failed),
    ("ERROR", SubTaskState::Failed),
];

/// 标签规范化：去空白、大写、空格和连字符统一为下划线
fn canonical_label(raw: &str) -> String {
    raw.trim()
        .to_ascii_uppercase()
        .replace(|c: char| c == ' ' || c == '-', "_")
}

fn lookup<T: Copy>(table: &[(&str, T)], raw: &str) -> Option<T> {
    let label = canonical_label(raw);
    table
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, value)| *value)
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "PENDING",
            TaskState::Started => "STARTED",
            TaskState::Progress => "PROGRESS",
            TaskState::Success => "SUCCESS",
            TaskState::PartialSuccess => "PARTIAL_SUCCESS",
            TaskState::Failure => "FAILURE",
        }
    }

    /// 按同义词表解析，大小写不敏感；未知标签返回 None
    pub fn from_label(raw: &str) -> Option<Self> {
        lookup(TASK_STATE_SYNONYMS, raw)
    }

    /// 终态之后不再期待状态变化，轮询停止
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Success | TaskState::PartialSuccess | TaskState::Failure
        )
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个分辨率子任务状态
///
/// 生命周期单调: QUEUED → RUNNING → {COMPLETED | FAILED}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubTaskState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl SubTaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubTaskState::Queued => "QUEUED",
            SubTaskState::Running => "RUNNING",
            SubTaskState::Completed => "COMPLETED",
            SubTaskState::Failed => "FAILED",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        lookup(SUB_TASK_STATE_SYNONYMS, raw)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, SubTaskState::Completed | SubTaskState::Failed)
    }
}

/// 子任务快照，客户端只读
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubTaskStatus {
    #[serde(skip_serializing)]
    pub resolution: Resolution,
    pub status: SubTaskState,
    /// 0-100，仅在 QUEUED/RUNNING 时有意义
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubTaskStatus {
    pub fn new(resolution: Resolution, status: SubTaskState) -> Self {
        Self {
            resolution,
            status,
            progress: 0.0,
            error: None,
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// 参与整体进度计算的有效进度：完成计 100，失败计 0
    pub fn effective_progress(&self) -> f64 {
        match self.status {
            SubTaskState::Completed => 100.0,
            SubTaskState::Failed => 0.0,
            SubTaskState::Queued | SubTaskState::Running => self.progress.clamp(0.0, 100.0),
        }
    }
}

/// 规范任务状态
///
/// 每次轮询都从原始响应整体重建，从不增量合并。
/// 序列化结果即规范响应结构，再次规范化得到相同值。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(rename = "progress")]
    pub overall_progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub details: BTreeMap<Resolution, SubTaskStatus>,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// 已完成、可以下载的分辨率
    pub fn completed_resolutions(&self) -> Vec<&Resolution> {
        self.details
            .iter()
            .filter(|(_, sub)| sub.status == SubTaskState::Completed)
            .map(|(resolution, _)| resolution)
            .collect()
    }

    /// 失败的分辨率及失败原因
    pub fn failed_resolutions(&self) -> Vec<(&Resolution, Option<&str>)> {
        self.details
            .iter()
            .filter(|(_, sub)| sub.status == SubTaskState::Failed)
            .map(|(resolution, sub)| (resolution, sub.error.as_deref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_synonyms() {
        for raw in ["SUCCESS", "COMPLETED", "success", "Completed"] {
            assert_eq!(TaskState::from_label(raw), Some(TaskState::Success), "{raw}");
        }
    }

    #[test]
    fn test_failure_synonyms() {
        for raw in ["FAILURE", "FAILED", "failure", "Failed"] {
            assert_eq!(TaskState::from_label(raw), Some(TaskState::Failure), "{raw}");
        }
    }

    #[test]
    fn test_label_separators() {
        assert_eq!(
            TaskState::from_label("partial-success"),
            Some(TaskState::PartialSuccess)
        );
        assert_eq!(TaskState::from_label(" in progress "), Some(TaskState::Progress));
        assert_eq!(TaskState::from_label("WHATEVER"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskState::Success.is_terminal());
        assert!(TaskState::PartialSuccess.is_terminal());
        assert!(TaskState::Failure.is_terminal());
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Started.is_terminal());
        assert!(!TaskState::Progress.is_terminal());
    }

    #[test]
    fn test_effective_progress() {
        let r = Resolution::new("720");
        let running = SubTaskStatus::new(r.clone(), SubTaskState::Running).with_progress(140.0);
        assert_eq!(running.effective_progress(), 100.0);
        let failed = SubTaskStatus::new(r.clone(), SubTaskState::Failed).with_progress(80.0);
        assert_eq!(failed.effective_progress(), 0.0);
        let done = SubTaskStatus::new(r, SubTaskState::Completed);
        assert_eq!(done.effective_progress(), 100.0);
    }
}
