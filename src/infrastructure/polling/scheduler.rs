//! Polling Scheduler - 后台状态轮询
//!
//! 同一个 TaskId 的所有订阅者共享一个轮询循环：
//! 第一个订阅启动循环，最后一个订阅释放时取消循环。
//! 同一时间最多只有一个请求在途，下一次请求在上一次结束后才安排。

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;

use super::backoff::Backoff;
use super::machine::{PollMachine, PollPhase};
use super::update::{PollError, PollOutcome, PollUpdate};
use crate::application::ports::TaskStatusApiPort;
use crate::domain::{normalize, TaskId, TaskStatus};

/// 轮询配置
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// 请求结束到下一次请求开始的间隔
    pub interval: Duration,
    /// 单个周期内失败请求的最大重试次数
    pub max_retries: u32,
    /// 退避基数
    pub backoff_base: Duration,
    /// 退避上限
    pub backoff_max: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2500),
            max_retries: 3,
            backoff_base: Duration::from_millis(1000),
            backoff_max: Duration::from_millis(30_000),
        }
    }
}

impl PollingConfig {
    fn backoff(&self) -> Backoff {
        Backoff::new(self.backoff_base, self.backoff_max)
    }
}

/// 共享循环登记项
struct LoopEntry {
    subscribers: usize,
    cancel: CancellationToken,
    refresh: Arc<Notify>,
    updates: watch::Receiver<Option<PollUpdate>>,
}

struct SchedulerInner {
    api: Arc<dyn TaskStatusApiPort>,
    config: PollingConfig,
    /// task_id -> 共享循环
    loops: DashMap<TaskId, LoopEntry>,
}

/// 轮询调度器
///
/// 必须在 tokio 运行时内使用（订阅时会 spawn 循环任务）
#[derive(Clone)]
pub struct PollingScheduler {
    inner: Arc<SchedulerInner>,
}

impl PollingScheduler {
    pub fn new(api: Arc<dyn TaskStatusApiPort>, config: PollingConfig) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                api,
                config,
                loops: DashMap::new(),
            }),
        }
    }

    /// 订阅任务状态
    ///
    /// 没有该任务的循环时立即发起第一次请求；已有循环时直接加入，
    /// 并能立刻读到最近一次发布的结果。
    pub fn subscribe(&self, task_id: TaskId) -> Subscription {
        let (updates, refresh) = {
            let mut entry = self
                .inner
                .loops
                .entry(task_id.clone())
                .or_insert_with(|| self.inner.start_loop(&task_id));
            entry.subscribers += 1;

            tracing::debug!(
                task_id = %task_id,
                subscribers = entry.subscribers,
                "Subscribed to task status"
            );
            (entry.updates.clone(), entry.refresh.clone())
        };

        Subscription {
            task_id,
            updates,
            refresh,
            scheduler: self.inner.clone(),
            active: true,
        }
    }

    /// 当前活跃的轮询循环数
    pub fn active_loops(&self) -> usize {
        self.inner.loops.len()
    }

    /// 某个任务的订阅者数量
    pub fn subscriber_count(&self, task_id: &TaskId) -> usize {
        self.inner
            .loops
            .get(task_id)
            .map(|entry| entry.subscribers)
            .unwrap_or(0)
    }
}

impl SchedulerInner {
    fn start_loop(&self, task_id: &TaskId) -> LoopEntry {
        let cancel = CancellationToken::new();
        let refresh = Arc::new(Notify::new());
        let (sender, updates) = watch::channel(None);

        let poll_loop = PollLoop {
            task_id: task_id.clone(),
            api: self.api.clone(),
            config: self.config.clone(),
            cancel: cancel.clone(),
            refresh: refresh.clone(),
            sender,
        };
        tokio::spawn(poll_loop.run());

        LoopEntry {
            subscribers: 0,
            cancel,
            refresh,
            updates,
        }
    }

    fn release(&self, task_id: &TaskId) {
        if let Some(mut entry) = self.loops.get_mut(task_id) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            tracing::debug!(
                task_id = %task_id,
                subscribers = entry.subscribers,
                "Unsubscribed from task status"
            );
        }

        // 重新检查计数，期间可能有新的订阅加入
        if let Some((_, entry)) = self.loops.remove_if(task_id, |_, e| e.subscribers == 0) {
            entry.cancel.cancel();
            tracing::info!(task_id = %task_id, "Last subscriber left, polling cancelled");
        }
    }
}

/// 订阅句柄
///
/// 离开作用域（或调用 `unsubscribe`）即释放；最后一个订阅释放后，
/// 不再发起新请求，在途请求的结果被丢弃。
pub struct Subscription {
    task_id: TaskId,
    updates: watch::Receiver<Option<PollUpdate>>,
    refresh: Arc<Notify>,
    scheduler: Arc<SchedulerInner>,
    active: bool,
}

impl Subscription {
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// 最近一次发布的结果
    pub fn latest(&self) -> Option<PollUpdate> {
        self.updates.borrow().clone()
    }

    /// 等待有新结果发布；循环已结束且没有未读结果时返回 false
    pub async fn changed(&mut self) -> bool {
        self.updates.changed().await.is_ok()
    }

    /// 等待下一次发布
    ///
    /// 循环结束（终态或已取消）且没有未读结果时返回 None。
    /// 订阅者处理较慢时中间结果可能被合并，只保证读到最新值。
    pub async fn next_update(&mut self) -> Option<PollUpdate> {
        loop {
            self.updates.changed().await.ok()?;
            if let Some(update) = self.updates.borrow_and_update().clone() {
                return Some(update);
            }
        }
    }

    /// 手动刷新：唤醒等待中的循环立即请求，终态下无效
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if std::mem::take(&mut self.active) {
            self.scheduler.release(&self.task_id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// 单个请求失败的原因
enum FetchFailure {
    Transport(String),
    Malformed(String),
}

impl FetchFailure {
    fn message(&self) -> &str {
        match self {
            FetchFailure::Transport(message) | FetchFailure::Malformed(message) => message,
        }
    }

    fn into_poll_error(self, attempts: u32) -> PollError {
        match self {
            FetchFailure::Transport(message) => PollError::Transport { attempts, message },
            FetchFailure::Malformed(message) => PollError::Malformed { attempts, message },
        }
    }
}

/// 单个 TaskId 的轮询循环
struct PollLoop {
    task_id: TaskId,
    api: Arc<dyn TaskStatusApiPort>,
    config: PollingConfig,
    cancel: CancellationToken,
    refresh: Arc<Notify>,
    sender: watch::Sender<Option<PollUpdate>>,
}

impl PollLoop {
    async fn run(self) {
        let mut machine = PollMachine::new();
        tracing::info!(task_id = %self.task_id, "Polling started");

        while machine.begin_fetch() {
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                outcome = self.fetch_with_retry() => outcome,
            };

            // 取消之后才完成的请求，结果直接丢弃
            if self.cancel.is_cancelled() {
                break;
            }

            let outcome = match outcome {
                Ok(status) => {
                    machine.on_status(&status);
                    tracing::debug!(
                        task_id = %self.task_id,
                        state = %status.state,
                        progress = status.overall_progress,
                        "Task status received"
                    );
                    PollOutcome::Status(status)
                }
                Err(error) => {
                    machine.on_failure();
                    tracing::warn!(task_id = %self.task_id, error = %error, "Status fetch failed");
                    PollOutcome::Error(error)
                }
            };

            self.sender.send_replace(Some(PollUpdate {
                task_id: self.task_id.clone(),
                phase: machine.phase(),
                outcome,
                received_at: Utc::now(),
            }));

            if !machine.should_continue() {
                tracing::info!(
                    task_id = %self.task_id,
                    "Task reached terminal state, polling stopped"
                );
                break;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = self.refresh.notified() => {
                    tracing::debug!(task_id = %self.task_id, "Manual refresh requested");
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        if machine.phase() != PollPhase::Terminal {
            tracing::debug!(
                task_id = %self.task_id,
                phase = machine.phase().as_str(),
                "Polling loop exited"
            );
        }
    }

    /// 一个周期：首次请求加最多 max_retries 次退避重试
    async fn fetch_with_retry(&self) -> Result<TaskStatus, PollError> {
        let backoff = self.config.backoff();
        let mut retries = 0u32;

        loop {
            match self.fetch_once().await {
                Ok(status) => return Ok(status),
                Err(failure) if retries >= self.config.max_retries => {
                    return Err(failure.into_poll_error(retries + 1));
                }
                Err(failure) => {
                    retries += 1;
                    let delay = backoff.delay(retries);
                    tracing::debug!(
                        task_id = %self.task_id,
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        error = failure.message(),
                        "Status fetch failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn fetch_once(&self) -> Result<TaskStatus, FetchFailure> {
        let body = self
            .api
            .fetch_status(&self.task_id)
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        normalize(&body).map_err(|e| FetchFailure::Malformed(e.to_string()))
    }
}
