//! 二级索引同步（index）
//!
//! 每次已提交的切面写入都会派生一次索引更新（搜索文档 + 关系图）。
//! 索引是尽力而为的副作用：失败只记录与计数，不回滚写入；
//! 同一更新重复应用必须收敛到相同状态。
//!
mod in_memory;

pub use in_memory::{GraphEdge, InMemoryIndex, IndexedAspect, SearchDocument};

use crate::aspect::AuditStamp;
use crate::error::DomainResult;
use crate::urn::Urn;
use crate::value_object::Version;
use async_trait::async_trait;
use bon::Builder;
use serde_json::Value;
use std::sync::Arc;

/// 一次已提交写入对应的索引更新
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct IndexUpdate {
    pub urn: Urn,
    #[builder(into)]
    pub entity_type: String,
    #[builder(into)]
    pub aspect_name: String,
    pub previous: Option<Value>,
    pub new: Value,
    pub version: Version,
    pub audit: AuditStamp,
}

#[async_trait]
pub trait IndexUpdateService: Send + Sync {
    async fn apply(&self, update: &IndexUpdate) -> DomainResult<()>;
}

#[async_trait]
impl<T> IndexUpdateService for Arc<T>
where
    T: IndexUpdateService + ?Sized,
{
    async fn apply(&self, update: &IndexUpdate) -> DomainResult<()> {
        (**self).apply(update).await
    }
}
