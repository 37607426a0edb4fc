//! 持久化（persist）
//!
//! 定义版本化切面存储及其事务协议，支持：
//! - 按 `(urn, aspect)` 读取最新版本、指定版本与完整历史（`AspectStore`）；
//! - 事务内基于期望前置版本的追加写入（`AspectTransaction`）；
//! - 冲突时整体重做的事务重试（`AspectStoreExt::run_in_transaction_with_retry`）。
//!
//! 该模块聚焦协议与重试编排，具体存储后端由上层提供实现并注入；
//! `InMemoryAspectStore` 供测试与本地开发使用。
//!
mod in_memory;
mod retry;
mod store;

pub use in_memory::InMemoryAspectStore;
pub use retry::{AspectStoreExt, Committed, RetryPolicy, TransactionalWork};
pub use store::{AspectStore, AspectTransaction, AspectWrite, IsolationLevel};
