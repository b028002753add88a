//! Sub-task Aggregator
//!
//! 由各分辨率子任务状态推导整体状态和整体进度

use std::collections::BTreeMap;

use super::status::{SubTaskState, SubTaskStatus, TaskState};
use super::value_objects::Resolution;

/// 聚合结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub state: TaskState,
    pub overall_progress: f64,
}

/// 聚合子任务
///
/// - 后端给出的终态直接采用（后端可能有客户端不知道的判定策略）
/// - 否则由 details 推导；details 为空时保持原始状态
/// - 整体进度为子任务有效进度的算术平均；details 为空时使用后端标量进度，缺省 0
pub fn aggregate(
    raw_state: TaskState,
    details: &BTreeMap<Resolution, SubTaskStatus>,
    scalar_progress: Option<f64>,
) -> Aggregate {
    let state = if raw_state.is_terminal() {
        raw_state
    } else {
        derive_state(raw_state, details)
    };

    Aggregate {
        state,
        overall_progress: overall_progress(details, scalar_progress),
    }
}

fn derive_state(raw_state: TaskState, details: &BTreeMap<Resolution, SubTaskStatus>) -> TaskState {
    let total = details.len();
    if total == 0 {
        return raw_state;
    }

    let (mut queued, mut running, mut completed, mut failed) = (0usize, 0usize, 0usize, 0usize);
    for sub in details.values() {
        match sub.status {
            SubTaskState::Queued => queued += 1,
            SubTaskState::Running => running += 1,
            SubTaskState::Completed => completed += 1,
            SubTaskState::Failed => failed += 1,
        }
    }

    if completed == total {
        TaskState::Success
    } else if failed == total {
        TaskState::Failure
    } else if queued + running == 0 {
        // 只剩 COMPLETED 与 FAILED 且两者都存在
        TaskState::PartialSuccess
    } else if queued == total {
        match raw_state {
            TaskState::Pending => TaskState::Pending,
            _ => TaskState::Started,
        }
    } else {
        TaskState::Progress
    }
}

fn overall_progress(
    details: &BTreeMap<Resolution, SubTaskStatus>,
    scalar_progress: Option<f64>,
) -> f64 {
    if details.is_empty() {
        return scalar_progress
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 100.0))
            .unwrap_or(0.0);
    }

    let sum: f64 = details.values().map(SubTaskStatus::effective_progress).sum();
    sum / details.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(entries: &[(&str, SubTaskState, f64)]) -> BTreeMap<Resolution, SubTaskStatus> {
        entries
            .iter()
            .map(|(label, status, progress)| {
                let resolution = Resolution::new(*label);
                (
                    resolution.clone(),
                    SubTaskStatus::new(resolution, *status).with_progress(*progress),
                )
            })
            .collect()
    }

    #[test]
    fn test_all_completed_is_success() {
        let d = details(&[
            ("360", SubTaskState::Completed, 0.0),
            ("720", SubTaskState::Completed, 0.0),
            ("1080", SubTaskState::Completed, 0.0),
        ]);
        for raw in [TaskState::Pending, TaskState::Started, TaskState::Progress] {
            let result = aggregate(raw, &d, None);
            assert_eq!(result.state, TaskState::Success);
            assert_eq!(result.overall_progress, 100.0);
        }
    }

    #[test]
    fn test_all_failed_is_failure() {
        let d = details(&[
            ("360", SubTaskState::Failed, 50.0),
            ("720", SubTaskState::Failed, 10.0),
        ]);
        let result = aggregate(TaskState::Progress, &d, Some(70.0));
        assert_eq!(result.state, TaskState::Failure);
        assert_eq!(result.overall_progress, 0.0);
    }

    #[test]
    fn test_mixed_finished_is_partial_success() {
        let d = details(&[
            ("360", SubTaskState::Completed, 0.0),
            ("720", SubTaskState::Failed, 0.0),
            ("1080", SubTaskState::Completed, 0.0),
        ]);
        let result = aggregate(TaskState::Progress, &d, None);
        assert_eq!(result.state, TaskState::PartialSuccess);
        assert!((result.overall_progress - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_unfinished_sub_task_blocks_partial_success() {
        let d = details(&[
            ("360", SubTaskState::Completed, 0.0),
            ("720", SubTaskState::Failed, 0.0),
            ("1080", SubTaskState::Running, 20.0),
        ]);
        let result = aggregate(TaskState::Pending, &d, None);
        assert_eq!(result.state, TaskState::Progress);
    }

    #[test]
    fn test_mean_progress_of_running_task() {
        let d = details(&[
            ("360", SubTaskState::Completed, 0.0),
            ("720", SubTaskState::Running, 40.0),
            ("1080", SubTaskState::Queued, 0.0),
        ]);
        let result = aggregate(TaskState::Progress, &d, None);
        assert_eq!(result.state, TaskState::Progress);
        assert_eq!(result.overall_progress.round(), 47.0);
    }

    #[test]
    fn test_all_queued_keeps_pending_or_started() {
        let d = details(&[
            ("360", SubTaskState::Queued, 0.0),
            ("720", SubTaskState::Queued, 0.0),
        ]);
        assert_eq!(aggregate(TaskState::Pending, &d, None).state, TaskState::Pending);
        assert_eq!(aggregate(TaskState::Started, &d, None).state, TaskState::Started);
        assert_eq!(aggregate(TaskState::Progress, &d, None).state, TaskState::Started);
    }

    #[test]
    fn test_terminal_raw_state_is_trusted() {
        let d = details(&[
            ("360", SubTaskState::Completed, 0.0),
            ("720", SubTaskState::Running, 50.0),
        ]);
        let result = aggregate(TaskState::Success, &d, None);
        assert_eq!(result.state, TaskState::Success);
        assert_eq!(result.overall_progress, 75.0);

        let result = aggregate(TaskState::Failure, &d, None);
        assert_eq!(result.state, TaskState::Failure);
    }

    #[test]
    fn test_empty_details_falls_back_to_raw_state_and_scalar() {
        let empty = BTreeMap::new();
        let result = aggregate(TaskState::Progress, &empty, Some(60.0));
        assert_eq!(result.state, TaskState::Progress);
        assert_eq!(result.overall_progress, 60.0);

        let result = aggregate(TaskState::Started, &empty, None);
        assert_eq!(result.state, TaskState::Started);
        assert_eq!(result.overall_progress, 0.0);

        let result = aggregate(TaskState::Progress, &empty, Some(250.0));
        assert_eq!(result.overall_progress, 100.0);
    }
}
