//! 领域层统一错误定义
//!
//! 覆盖注册表校验、身份解析、切面存储（含乐观并发与事务重试）、
//! 扇出（索引/事件）以及配置等最小必要集合，便于在各实现层统一转换为 `DomainError`。
//!
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 注册表/校验（从不重试） ---
    #[error("unknown entity type: {entity_type}")]
    UnknownEntityType { entity_type: String },
    #[error("unknown aspect: entity_type={entity_type}, aspect={aspect}")]
    UnknownAspect { entity_type: String, aspect: String },
    #[error("invalid aspect: aspect={aspect}, reason={reason}")]
    InvalidAspect { aspect: String, reason: String },
    #[error("invalid key aspect: entity_type={entity_type}, reason={reason}")]
    InvalidKeyAspect { entity_type: String, reason: String },
    #[error("ambiguous identity: {reason}")]
    AmbiguousIdentity { reason: String },
    #[error("invalid urn: {urn}, reason={reason}")]
    InvalidUrn { urn: String, reason: String },

    // --- 存储/事务 ---
    #[error("version conflict: urn={urn}, aspect={aspect}, expected={expected:?}, actual={actual:?}")]
    VersionConflict {
        urn: String,
        aspect: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },
    #[error("transaction retry exhausted after {attempts} attempts: {last_error}")]
    TransactionRetryExhausted { attempts: usize, last_error: String },
    #[error("transaction timed out after {elapsed_ms}ms")]
    TransactionTimeout { elapsed_ms: u64 },
    #[error("storage error: {reason}")]
    Storage { reason: String },

    // --- 扇出（已提交后的副作用，不影响写入结果） ---
    #[error("index update failed: urn={urn}, aspect={aspect}, reason={reason}")]
    IndexUpdateFailed {
        urn: String,
        aspect: String,
        reason: String,
    },
    #[error("event publish failed: urn={urn}, aspect={aspect}, reason={reason}")]
    EventPublishFailed {
        urn: String,
        aspect: String,
        reason: String,
    },

    // --- 批次/配置/序列化 ---
    #[error("batch too large: size={size}, max={max}")]
    BatchTooLarge { size: usize, max: usize },
    #[error("config error: {reason}")]
    Config { reason: String },
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

/// 面向调用方的错误分类（逐条结果中的 `errorKind`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownEntityType,
    UnknownAspect,
    InvalidAspect,
    AmbiguousIdentity,
    VersionConflict,
    TransactionRetryExhausted,
    TransactionTimeout,
    StorageFailure,
    IndexUpdateFailed,
    EventPublishFailed,
    BatchTooLarge,
    Config,
    Serialization,
}

impl DomainError {
    /// 仅乐观并发冲突可在新事务中重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::VersionConflict { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::UnknownEntityType { .. } => ErrorKind::UnknownEntityType,
            DomainError::UnknownAspect { .. } => ErrorKind::UnknownAspect,
            DomainError::InvalidAspect { .. } => ErrorKind::InvalidAspect,
            // 键切面与 urn 问题都属于身份解析失败
            DomainError::InvalidKeyAspect { .. }
            | DomainError::AmbiguousIdentity { .. }
            | DomainError::InvalidUrn { .. } => ErrorKind::AmbiguousIdentity,
            DomainError::VersionConflict { .. } => ErrorKind::VersionConflict,
            DomainError::TransactionRetryExhausted { .. } => ErrorKind::TransactionRetryExhausted,
            DomainError::TransactionTimeout { .. } => ErrorKind::TransactionTimeout,
            DomainError::Storage { .. } => ErrorKind::StorageFailure,
            DomainError::IndexUpdateFailed { .. } => ErrorKind::IndexUpdateFailed,
            DomainError::EventPublishFailed { .. } => ErrorKind::EventPublishFailed,
            DomainError::BatchTooLarge { .. } => ErrorKind::BatchTooLarge,
            DomainError::Config { .. } => ErrorKind::Config,
            DomainError::Serde { .. } => ErrorKind::Serialization,
        }
    }

    pub fn storage(reason: impl Into<String>) -> Self {
        DomainError::Storage {
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        DomainError::Config {
            reason: reason.into(),
        }
    }

    pub fn ambiguous(reason: impl Into<String>) -> Self {
        DomainError::AmbiguousIdentity {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Storage {
            reason: err.to_string(),
        }
    }
}
