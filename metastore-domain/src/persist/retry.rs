//! 事务重试（run_in_transaction_with_retry）
//!
//! 以固定隔离级别开启新事务执行一段工作并提交；遇到乐观并发冲突时丢弃整个事务、
//! 以指数退避后在全新事务中重做，直至成功或用尽重试预算。
//!
use super::{AspectStore, AspectTransaction, IsolationLevel};
use crate::error::{DomainError, DomainResult};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 首次尝试之外允许的重试次数，尝试总数上限为 `max_retries + 1`
    pub max_retries: usize,
    pub isolation: IsolationLevel,
    /// 第一次重试前的等待；之后逐次翻倍
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    /// 单次尝试（工作 + 提交）的超时
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            isolation: IsolationLevel::RepeatableRead,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::from_millis(100),
            attempt_timeout: None,
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// 第 `retry` 次重试（从 1 开始）前的等待时长
    pub fn backoff(&self, retry: usize) -> Duration {
        if self.base_backoff.is_zero() || retry == 0 {
            return Duration::ZERO;
        }
        let shift = (retry - 1).min(16) as u32;
        self.base_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}

/// 在单个事务中执行的工作单元。每次尝试都会拿到全新的事务，实现必须可重入。
#[async_trait]
pub trait TransactionalWork: Send + Sync {
    type Output: Send;

    async fn attempt(&self, txn: &mut dyn AspectTransaction) -> DomainResult<Self::Output>;
}

/// 已提交的工作结果与实际尝试次数
#[derive(Debug, Clone, PartialEq)]
pub struct Committed<T> {
    pub value: T,
    pub attempts: usize,
}

#[async_trait]
pub trait AspectStoreExt: AspectStore {
    async fn run_in_transaction_with_retry<W>(
        &self,
        work: &W,
        policy: &RetryPolicy,
    ) -> DomainResult<Committed<W::Output>>
    where
        W: TransactionalWork,
    {
        let mut attempts = 0usize;
        loop {
            attempts += 1;
            let started = Instant::now();

            let outcome = match policy.attempt_timeout {
                Some(limit) => {
                    match tokio::time::timeout(limit, self.run_once(work, policy.isolation)).await
                    {
                        Ok(outcome) => outcome,
                        Err(_) => Err(DomainError::TransactionTimeout {
                            elapsed_ms: started.elapsed().as_millis() as u64,
                        }),
                    }
                }
                None => self.run_once(work, policy.isolation).await,
            };

            match outcome {
                Ok(value) => return Ok(Committed { value, attempts }),
                Err(err) if err.is_retryable() && attempts < policy.max_attempts() => {
                    let delay = policy.backoff(attempts);
                    debug!(attempt = attempts, ?delay, error = %err, "transaction conflict, retrying");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) if err.is_retryable() => {
                    warn!(attempts, error = %err, "transaction retry budget exhausted");
                    return Err(DomainError::TransactionRetryExhausted {
                        attempts,
                        last_error: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// 单次尝试：开启事务、执行工作、提交；工作失败时回滚
    async fn run_once<W>(&self, work: &W, isolation: IsolationLevel) -> DomainResult<W::Output>
    where
        W: TransactionalWork,
    {
        let mut txn = self.begin(isolation).await?;
        match work.attempt(&mut *txn).await {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

impl<T: AspectStore + ?Sized> AspectStoreExt for T {}
