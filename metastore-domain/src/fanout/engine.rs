//! 扇出引擎（FanoutEngine）
//!
//! 统一编排“提交 → 索引更新 → 事件发布”的副作用：
//! - 就地模式下由写入方直接等待副作用完成（仍在提交之后）；
//! - 后台模式下任务进入有界队列，由长驻任务以有限并发处理；
//! - 每个副作用最多尝试 `max_attempts` 次，最终失败只记录与计数；
//! - 提供关闭与等待的 `FanoutHandle`，关闭时先排空队列再退出。
//!
use super::{FanoutConfig, FanoutJob, FanoutMode, FanoutStats};
use crate::error::DomainError;
use crate::eventing::{AspectChangeEvent, EventProducer};
use crate::index::{IndexUpdate, IndexUpdateService};
use bon::Builder;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// FanoutEngine：持有副作用的下游（索引、事件生产者）与扇出配置
#[derive(Builder)]
pub struct FanoutEngine {
    index: Arc<dyn IndexUpdateService>,
    producer: Arc<dyn EventProducer>,
    #[builder(default)]
    config: FanoutConfig,
    #[builder(default)]
    stats: Arc<FanoutStats>,
}

impl FanoutEngine {
    pub fn stats(&self) -> Arc<FanoutStats> {
        self.stats.clone()
    }

    fn executor(&self) -> FanoutExecutor {
        FanoutExecutor {
            index: self.index.clone(),
            producer: self.producer.clone(),
            stats: self.stats.clone(),
            max_attempts: self.config.max_attempts.max(1),
        }
    }

    /// 就地分发器：副作用在调用方任务中执行
    pub fn inline(&self) -> FanoutDispatcher {
        FanoutDispatcher {
            target: DispatchTarget::Inline(self.executor()),
            stats: self.stats.clone(),
        }
    }

    /// 启动后台任务，返回入队分发器与运行句柄
    pub fn start(&self) -> (FanoutDispatcher, FanoutHandle) {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let executor = self.executor();
        let concurrency = self.config.concurrency.max(1);

        let task = tokio::spawn(Self::worker_loop(executor, rx, concurrency, token.clone()));

        let dispatcher = FanoutDispatcher {
            target: DispatchTarget::Queue(tx),
            stats: self.stats.clone(),
        };
        (
            dispatcher,
            FanoutHandle {
                token,
                tasks: vec![task],
            },
        )
    }

    /// 按配置的模式构造分发器；仅后台模式返回句柄
    pub fn launch(&self) -> (FanoutDispatcher, Option<FanoutHandle>) {
        match self.config.mode {
            FanoutMode::Inline => (self.inline(), None),
            FanoutMode::Background => {
                let (dispatcher, handle) = self.start();
                (dispatcher, Some(handle))
            }
        }
    }

    async fn worker_loop(
        executor: FanoutExecutor,
        rx: mpsc::Receiver<FanoutJob>,
        concurrency: usize,
        token: CancellationToken,
    ) {
        let mut jobs = ReceiverStream::new(rx);
        let run = |job: FanoutJob| {
            let executor = executor.clone();
            async move { executor.run(&job).await }
        };

        (&mut jobs)
            .take_until(token.cancelled())
            .for_each_concurrent(Some(concurrency), run)
            .await;

        // 不再接收新任务，处理完已入队的部分后退出
        jobs.close();
        jobs.for_each_concurrent(Some(concurrency), run).await;
        info!("fanout worker stopped");
    }
}

#[derive(Clone)]
struct FanoutExecutor {
    index: Arc<dyn IndexUpdateService>,
    producer: Arc<dyn EventProducer>,
    stats: Arc<FanoutStats>,
    max_attempts: usize,
}

impl FanoutExecutor {
    async fn run(&self, job: &FanoutJob) {
        self.apply_index(&job.index_update).await;
        self.publish_event(&job.event).await;
    }

    async fn apply_index(&self, update: &IndexUpdate) {
        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            match self.index.apply(update).await {
                Ok(()) => {
                    self.stats.record_index(true);
                    return;
                }
                Err(err) => {
                    debug!(attempt, urn = %update.urn, aspect = %update.aspect_name, error = %err, "index update attempt failed");
                    last_error = Some(err);
                }
            }
        }

        self.stats.record_index(false);
        let failure = DomainError::IndexUpdateFailed {
            urn: update.urn.to_string(),
            aspect: update.aspect_name.clone(),
            reason: last_error.map(|e| e.to_string()).unwrap_or_default(),
        };
        warn!(error = %failure, attempts = self.max_attempts, "index update abandoned");
    }

    async fn publish_event(&self, event: &AspectChangeEvent) {
        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            match self.producer.publish(event).await {
                Ok(()) => {
                    self.stats.record_event(true);
                    return;
                }
                Err(err) => {
                    debug!(attempt, urn = %event.urn(), aspect = event.aspect_name(), error = %err, "event publish attempt failed");
                    last_error = Some(err);
                }
            }
        }

        self.stats.record_event(false);
        let failure = DomainError::EventPublishFailed {
            urn: event.urn().to_string(),
            aspect: event.aspect_name().to_string(),
            reason: last_error.map(|e| e.to_string()).unwrap_or_default(),
        };
        warn!(error = %failure, attempts = self.max_attempts, "event publish abandoned");
    }
}

#[derive(Clone)]
enum DispatchTarget {
    Inline(FanoutExecutor),
    Queue(mpsc::Sender<FanoutJob>),
}

/// 服务侧的扇出入口
#[derive(Clone)]
pub struct FanoutDispatcher {
    target: DispatchTarget,
    stats: Arc<FanoutStats>,
}

impl FanoutDispatcher {
    pub fn mode(&self) -> FanoutMode {
        match self.target {
            DispatchTarget::Inline(_) => FanoutMode::Inline,
            DispatchTarget::Queue(_) => FanoutMode::Background,
        }
    }

    pub fn stats(&self) -> Arc<FanoutStats> {
        self.stats.clone()
    }

    /// 队列已满时等待；后台任务已关闭时计为丢弃
    pub async fn dispatch(&self, job: FanoutJob) {
        match &self.target {
            DispatchTarget::Inline(executor) => executor.run(&job).await,
            DispatchTarget::Queue(tx) => {
                if let Err(mpsc::error::SendError(job)) = tx.send(job).await {
                    self.stats.record_dropped();
                    warn!(
                        urn = %job.index_update.urn,
                        aspect = %job.index_update.aspect_name,
                        "fanout worker stopped, job dropped"
                    );
                }
            }
        }
    }
}

/// 后台扇出的运行句柄：用于优雅关闭与等待任务结束
pub struct FanoutHandle {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl FanoutHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub async fn join(mut self) {
        let tasks = std::mem::take(&mut self.tasks);

        for t in tasks {
            let _ = t.await;
        }
    }
}

impl Drop for FanoutHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
