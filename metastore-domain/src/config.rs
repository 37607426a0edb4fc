//! 运行配置（MetastoreConfig）
//!
//! JSON 格式，所有字段可省略并回退到默认值：
//!
//! ```json
//! {
//!   "retry":   { "max_retries": 3, "isolation_level": "repeatable_read",
//!                "base_backoff_ms": 0, "max_backoff_ms": 100, "attempt_timeout_ms": null },
//!   "fanout":  { "mode": "inline", "queue_capacity": 1024, "concurrency": 8, "max_attempts": 1 },
//!   "limits":  { "max_batch_size": 1000, "max_aspect_bytes": 1048576 },
//!   "service": { "batch_concurrency": 1, "write_key_aspect": true }
//! }
//! ```
//!
use crate::error::{DomainError, DomainResult};
use crate::persist::{IsolationLevel, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub isolation_level: IsolationLevel,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub attempt_timeout_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            isolation_level: IsolationLevel::RepeatableRead,
            base_backoff_ms: 0,
            max_backoff_ms: 100,
            attempt_timeout_ms: None,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            isolation: self.isolation_level,
            base_backoff: Duration::from_millis(self.base_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            attempt_timeout: self.attempt_timeout_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanoutMode {
    /// 写入提交后就地执行索引更新与事件发布
    #[default]
    Inline,
    /// 提交后入队，由后台任务执行
    Background,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    pub mode: FanoutMode,
    pub queue_capacity: usize,
    pub concurrency: usize,
    /// 每个副作用（索引/事件）的尝试次数
    pub max_attempts: usize,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            mode: FanoutMode::Inline,
            queue_capacity: 1024,
            concurrency: 8,
            max_attempts: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_batch_size: usize,
    pub max_aspect_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            max_aspect_bytes: 1_048_576,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// 批内并发度，结果顺序不受影响
    pub batch_concurrency: usize,
    /// 新实体首次写入时是否同时写入其键切面
    pub write_key_aspect: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            batch_concurrency: 1,
            write_key_aspect: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetastoreConfig {
    pub retry: RetryConfig,
    pub fanout: FanoutConfig,
    pub limits: LimitsConfig,
    pub service: ServiceConfig,
}

impl MetastoreConfig {
    pub fn from_json_str(raw: &str) -> DomainResult<Self> {
        let config: MetastoreConfig = serde_json::from_str(raw)
            .map_err(|err| DomainError::config(format!("parse config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> DomainResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|err| DomainError::config(format!("read {}: {err}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// 文件不存在时返回默认配置
    pub fn load_or_default(path: impl AsRef<Path>) -> DomainResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let positive = [
            ("fanout.queue_capacity", self.fanout.queue_capacity),
            ("fanout.concurrency", self.fanout.concurrency),
            ("fanout.max_attempts", self.fanout.max_attempts),
            ("limits.max_batch_size", self.limits.max_batch_size),
            ("limits.max_aspect_bytes", self.limits.max_aspect_bytes),
            ("service.batch_concurrency", self.service.batch_concurrency),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(DomainError::config(format!("{name} must be greater than 0")));
            }
        }
        if self.retry.base_backoff_ms > self.retry.max_backoff_ms {
            return Err(DomainError::config(
                "retry.base_backoff_ms must not exceed retry.max_backoff_ms",
            ));
        }
        if self.retry.attempt_timeout_ms == Some(0) {
            return Err(DomainError::config("retry.attempt_timeout_ms must be greater than 0"));
        }
        Ok(())
    }
}
