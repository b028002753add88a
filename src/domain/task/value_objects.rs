//! Task Context - Value Objects

use serde::{Deserialize, Serialize};

/// 转码任务唯一标识
///
/// 由后端在上传时分配，客户端视为不透明字符串。
///
/// 不变量:
/// - 去除首尾空白后非空
/// - 不是 `.` 或 `..`（会被 URL 解析为相对路径）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Result<Self, &'static str> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("任务 ID 不能为空");
        }
        if trimmed == "." || trimmed == ".." {
            return Err("任务 ID 不能是 . 或 ..");
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskId {
    type Error = &'static str;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 分辨率标签（如 "360"、"720p"）
///
/// 作为 details 映射的键，保持后端给出的原样
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resolution(String);

impl Resolution {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_trims_whitespace() {
        let id = TaskId::new("  abc123\n").unwrap();
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn test_task_id_rejects_empty() {
        assert!(TaskId::new("").is_err());
        assert!(TaskId::new("   ").is_err());
    }

    #[test]
    fn test_task_id_rejects_dot_segments() {
        assert!(TaskId::new(".").is_err());
        assert!(TaskId::new(" .. ").is_err());
        assert!(TaskId::new("...").is_ok());
        assert!(TaskId::new("a/../b").is_ok());
    }

    #[test]
    fn test_task_id_serde_rejects_empty() {
        let result: Result<TaskId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
