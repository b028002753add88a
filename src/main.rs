//! StreamScale - 视频转码任务状态客户端
//!
//! 命令行入口：
//! - upload: 上传视频并记录活动任务
//! - watch: 轮询任务状态直到终态
//! - links: 输出已完成分辨率的下载地址
//! - cancel / clear: 取消任务、清除活动句柄

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use streamscale::application::{
    ApplicationError, CancelTaskCommand, CancelTaskHandler, GetDownloadLinks,
    GetDownloadLinksHandler, ResolveActiveTask, ResolveActiveTaskHandler, StartOverCommand,
    StartOverHandler, SubmitUploadCommand, SubmitUploadHandler, TaskHandleStorePort,
    TaskStatusApiPort,
};
use streamscale::config::{load_config_from_path, print_config, AppConfig};
use streamscale::domain::{TaskId, TaskStatus};
use streamscale::infrastructure::polling::{PollOutcome, PollUpdate};
use streamscale::infrastructure::{HttpStatusClient, PollingScheduler, SledTaskHandleStore};

#[derive(Parser)]
#[command(name = "streamscale")]
#[command(about = "Track adaptive video transcoding tasks", long_about = None)]
struct Cli {
    /// Config file path (defaults to ./config.toml)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a video and remember it as the active task
    Upload {
        /// Video file to upload
        file: PathBuf,

        /// Keep polling after the upload
        #[arg(short = 'w', long)]
        watch: bool,
    },
    /// Poll task status until it reaches a terminal state
    Watch {
        /// Task ID (defaults to the stored active task)
        task_id: Option<String>,
    },
    /// Print download links for completed resolutions
    Links {
        /// Task ID (defaults to the stored active task)
        task_id: Option<String>,
    },
    /// Cancel a running task
    Cancel {
        /// Task ID (defaults to the stored active task)
        task_id: Option<String>,
    },
    /// Forget the stored active task
    Clear,
}

struct App {
    config: AppConfig,
    api: Arc<dyn TaskStatusApiPort>,
    store: Arc<dyn TaskHandleStorePort>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config_from_path(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},streamscale={}", config.log.level, config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    print_config(&config);

    let api: Arc<dyn TaskStatusApiPort> =
        Arc::new(HttpStatusClient::new(config.api.client_config())?);
    let store: Arc<dyn TaskHandleStorePort> =
        SledTaskHandleStore::new(&config.store.sled_config())?.arc();

    let app = App { config, api, store };

    match cli.command {
        Commands::Upload { file, watch } => {
            let response = SubmitUploadHandler::new(app.api.clone(), app.store.clone())
                .handle(SubmitUploadCommand { file })
                .await?;
            println!("Task: {}", response.task_id);

            if watch {
                app.watch(Some(response.task_id)).await?;
            }
        }
        Commands::Watch { task_id } => {
            let task_id = parse_task_id(task_id)?;
            app.watch(task_id).await?;
        }
        Commands::Links { task_id } => {
            let task_id = parse_task_id(task_id)?;
            app.links(task_id).await?;
        }
        Commands::Cancel { task_id } => {
            let task_id = parse_task_id(task_id)?;
            let response = CancelTaskHandler::new(app.api.clone(), app.store.clone())
                .handle(CancelTaskCommand { task_id })
                .await?;
            println!("Cancelled: {}", response.task_id);
        }
        Commands::Clear => {
            StartOverHandler::new(app.store.clone()).handle(StartOverCommand)?;
            println!("Active task cleared");
        }
    }

    Ok(())
}

fn parse_task_id(raw: Option<String>) -> anyhow::Result<Option<TaskId>> {
    raw.map(|id| TaskId::new(id).map_err(|e| anyhow::anyhow!("Invalid task ID: {}", e)))
        .transpose()
}

impl App {
    fn resolve(&self, explicit: Option<TaskId>) -> Result<TaskId, ApplicationError> {
        let resolved = ResolveActiveTaskHandler::new(self.store.clone())
            .handle(ResolveActiveTask { explicit })?;
        Ok(resolved.task_id)
    }

    /// 订阅任务直到终态或 Ctrl-C
    async fn watch(&self, explicit: Option<TaskId>) -> anyhow::Result<()> {
        let task_id = self.resolve(explicit)?;
        let scheduler =
            PollingScheduler::new(self.api.clone(), self.config.polling.scheduler_config());
        let mut subscription = scheduler.subscribe(task_id.clone());

        tracing::info!(task_id = %task_id, "Watching task");

        let mut last_status: Option<TaskStatus> = None;
        loop {
            let update = tokio::select! {
                update = subscription.next_update() => update,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!(task_id = %task_id, "Interrupted, stopping poll");
                    break;
                }
            };

            let Some(update) = update else {
                break;
            };

            print_update(&update);
            if let Some(status) = update.status() {
                last_status = Some(status.clone());
            }
            if update.is_terminal() {
                break;
            }
        }

        subscription.unsubscribe();

        if let Some(status) = last_status.filter(TaskStatus::is_terminal) {
            self.print_links(task_id, status);
        }
        Ok(())
    }

    /// 请求一次状态并输出下载地址
    async fn links(&self, explicit: Option<TaskId>) -> anyhow::Result<()> {
        let task_id = self.resolve(explicit)?;
        let scheduler =
            PollingScheduler::new(self.api.clone(), self.config.polling.scheduler_config());
        let mut subscription = scheduler.subscribe(task_id.clone());

        let update = subscription
            .next_update()
            .await
            .ok_or_else(|| anyhow::anyhow!("Polling stopped before a status arrived"))?;
        subscription.unsubscribe();

        match update.outcome {
            PollOutcome::Status(status) => {
                self.print_links(task_id, status);
                Ok(())
            }
            PollOutcome::Error(e) => Err(e.into()),
        }
    }

    fn print_links(&self, task_id: TaskId, status: TaskStatus) {
        let links = GetDownloadLinksHandler::new(self.api.clone())
            .handle(GetDownloadLinks { task_id, status });

        if links.is_empty() {
            println!("No completed renditions yet");
            return;
        }
        for link in links {
            match link.resolution {
                Some(resolution) => println!("{:>8}  {}", resolution.as_str(), link.url),
                None => println!("{:>8}  {}", "all", link.url),
            }
        }
    }
}

fn print_update(update: &PollUpdate) {
    let time = update.received_at.format("%H:%M:%S");
    match &update.outcome {
        PollOutcome::Status(status) => {
            let stage = status.stage.as_deref().unwrap_or("-");
            println!(
                "[{}] {} {:>5.1}% {}",
                time, status.state.as_str(), status.overall_progress, stage
            );
            for (resolution, sub) in &status.details {
                match &sub.error {
                    Some(error) => println!(
                        "    {:>6} {} ({})",
                        resolution.as_str(),
                        sub.status.as_str(),
                        error
                    ),
                    None => println!(
                        "    {:>6} {} {:>5.1}%",
                        resolution.as_str(),
                        sub.status.as_str(),
                        sub.effective_progress()
                    ),
                }
            }
            if let Some(error) = &status.error {
                println!("    error: {}", error);
            }
        }
        PollOutcome::Error(error) => {
            println!("[{}] poll failed: {}", time, error);
        }
    }
}
