//! Status Normalizer
//!
//! 将后端原始状态响应转换为规范 `TaskStatus`。
//!
//! 支持两种历史结构:
//! - 当前结构: `{state, progress?, stage?, error?, message?, details?}`
//! - 旧 worker 结构: `{task_id?, status, progress?, meta|info: {progress?, stage?, details?}}`
//!
//! 字段名大小写不敏感，忽略 `_` / `-`（`overall_progress` 与 `overallProgress` 等价）。
//! 除了根本不是 JSON 对象的响应外，其余情况都降级处理而不是报错。

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::aggregator::aggregate;
use super::errors::NormalizeError;
use super::status::{SubTaskState, SubTaskStatus, TaskState, TaskStatus};
use super::value_objects::Resolution;

/// 缺少 state 字段时记录在 stage 中的诊断文本
const MISSING_STATE_STAGE: &str = "missing state";

/// 嵌套元数据字段（旧结构）
const NESTED_KEYS: &[&str] = &["meta", "info", "result"];

/// 原始响应的字段视图：顶层优先，其次嵌套元数据
struct Payload<'a> {
    top: &'a Map<String, Value>,
    nested: Option<&'a Map<String, Value>>,
}

impl<'a> Payload<'a> {
    fn new(top: &'a Map<String, Value>) -> Self {
        let nested = NESTED_KEYS
            .iter()
            .find_map(|key| field(top, key))
            .and_then(Value::as_object);
        Self { top, nested }
    }

    fn get(&self, names: &[&str]) -> Option<&'a Value> {
        names
            .iter()
            .find_map(|name| field(self.top, name))
            .or_else(|| {
                self.nested
                    .and_then(|nested| names.iter().find_map(|name| field(nested, name)))
            })
    }
}

/// 字段名折叠：小写并去掉分隔符
fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// 按折叠后的名字查找非 null 字段
fn field<'a>(obj: &'a Map<String, Value>, folded_name: &str) -> Option<&'a Value> {
    obj.iter()
        .find(|(key, value)| !value.is_null() && fold_key(key) == folded_name)
        .map(|(_, value)| value)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// 进度可以是数字或数字字符串，结果截断到 [0, 100]
fn as_progress(value: &Value) -> Option<f64> {
    let progress = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }?;
    progress.is_finite().then(|| progress.clamp(0.0, 100.0))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 规范化原始字节（HTTP 响应体）
pub fn normalize_bytes(body: &[u8]) -> Result<TaskStatus, NormalizeError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| NormalizeError::MalformedResponse(format!("invalid JSON: {}", e)))?;
    normalize(&value)
}

/// 规范化原始状态响应
///
/// 纯函数。对已经是规范结构的输入是幂等的。
pub fn normalize(raw: &Value) -> Result<TaskStatus, NormalizeError> {
    let obj = raw.as_object().ok_or_else(|| {
        NormalizeError::MalformedResponse(format!("expected JSON object, got {}", json_kind(raw)))
    })?;
    let payload = Payload::new(obj);

    let (raw_state, degraded) = match payload.get(&["state", "status"]) {
        Some(Value::String(label)) => match TaskState::from_label(label) {
            Some(state) => (state, None),
            None => {
                tracing::warn!(state = %label, "Unknown task state, degrading to PENDING");
                (TaskState::Pending, Some(Degraded::Unknown(label.clone())))
            }
        },
        Some(other) => {
            tracing::warn!(state = %other, "Non-string task state, degrading to PENDING");
            (TaskState::Pending, Some(Degraded::Unknown(other.to_string())))
        }
        None => {
            tracing::warn!("Status response has no state, degrading to PENDING");
            (TaskState::Pending, Some(Degraded::Missing))
        }
    };

    let details = payload
        .get(&["details", "subtasks"])
        .map(parse_details)
        .unwrap_or_default();

    let scalar_progress = payload
        .get(&["progress", "overallprogress", "percent"])
        .and_then(as_progress);

    let aggregated = aggregate(raw_state, &details, scalar_progress);

    Ok(TaskStatus {
        state: aggregated.state,
        overall_progress: aggregated.overall_progress,
        stage: stage_with_diagnostic(payload.get(&["stage"]).and_then(as_text), degraded),
        error: payload.get(&["error", "errormessage"]).and_then(as_text),
        message: payload.get(&["message"]).and_then(as_text),
        details,
    })
}

/// 状态降级为 PENDING 的原因
enum Degraded {
    Unknown(String),
    Missing,
}

/// 未知状态标签始终保留在 stage 中，和后端给出的 stage 并存
fn stage_with_diagnostic(stage: Option<String>, degraded: Option<Degraded>) -> Option<String> {
    match (stage, degraded) {
        (Some(stage), Some(Degraded::Unknown(label))) => {
            Some(format!("{} (state: {})", stage, label))
        }
        (Some(stage), _) => Some(stage),
        (None, Some(Degraded::Unknown(label))) => Some(label),
        (None, Some(Degraded::Missing)) => Some(MISSING_STATE_STAGE.to_string()),
        (None, None) => None,
    }
}

fn parse_details(value: &Value) -> BTreeMap<Resolution, SubTaskStatus> {
    let Some(entries) = value.as_object() else {
        tracing::warn!(kind = json_kind(value), "Ignoring non-object details field");
        return BTreeMap::new();
    };

    entries
        .iter()
        .filter_map(|(label, entry)| {
            let resolution = Resolution::new(label.as_str());
            let sub = match entry {
                Value::Object(fields) => parse_sub_task(resolution.clone(), fields),
                // 旧结构: {"360": "COMPLETED"}
                Value::String(status) => SubTaskStatus::new(
                    resolution.clone(),
                    parse_sub_task_state(Some(status.as_str())),
                ),
                other => {
                    tracing::warn!(
                        resolution = %label,
                        kind = json_kind(other),
                        "Skipping malformed sub-task entry"
                    );
                    return None;
                }
            };
            Some((resolution, sub))
        })
        .collect()
}

fn parse_sub_task(resolution: Resolution, fields: &Map<String, Value>) -> SubTaskStatus {
    let status = field(fields, "status")
        .or_else(|| field(fields, "state"))
        .and_then(Value::as_str);

    SubTaskStatus {
        resolution,
        status: parse_sub_task_state(status),
        progress: field(fields, "progress").and_then(as_progress).unwrap_or(0.0),
        error: field(fields, "error").and_then(as_text),
    }
}

/// 缺失或未知的子任务状态视为 QUEUED
fn parse_sub_task_state(raw: Option<&str>) -> SubTaskState {
    match raw {
        Some(label) => SubTaskState::from_label(label).unwrap_or_else(|| {
            tracing::debug!(status = %label, "Unknown sub-task status, treating as QUEUED");
            SubTaskState::Queued
        }),
        None => SubTaskState::Queued,
    }
}
