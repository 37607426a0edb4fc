//! 切面存储协议（AspectStore / AspectTransaction）
//!
//! 以 `(urn, aspect, version)` 为键保存不可变的切面版本，并维护每个 `(urn, aspect)`
//! 的最新版本指针。写入只能通过事务进行，提交时执行乐观并发校验。
//!
use crate::aspect::{AspectKey, AspectRecord, AuditStamp, SystemMetadata};
use crate::error::DomainResult;
use crate::urn::Urn;
use crate::value_object::Version;
use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// 事务隔离级别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// 仅校验写入的前置版本
    ReadCommitted,
    /// 额外校验事务内读取过的键在提交时未被他人改写
    #[default]
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn validates_reads(&self) -> bool {
        !matches!(self, IsolationLevel::ReadCommitted)
    }
}

/// 待写入的切面（版本号由存储在插入时分配）
#[derive(Debug, Clone, Builder)]
pub struct AspectWrite {
    urn: Urn,
    aspect_name: String,
    payload: Value,
    audit: AuditStamp,
    system_metadata: Option<SystemMetadata>,
}

impl AspectWrite {
    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    pub fn aspect_name(&self) -> &str {
        &self.aspect_name
    }

    pub fn key(&self) -> AspectKey {
        AspectKey::new(self.urn.clone(), self.aspect_name.clone())
    }

    /// 以给定版本号固化为记录
    pub fn into_record(self, version: Version) -> AspectRecord {
        AspectRecord::builder()
            .urn(self.urn)
            .aspect_name(self.aspect_name)
            .version(version)
            .payload(self.payload)
            .audit(self.audit)
            .maybe_system_metadata(self.system_metadata)
            .build()
    }
}

/// 单个存储事务。提交/回滚消费事务本身，事务句柄不可复用。
#[async_trait]
pub trait AspectTransaction: Send {
    /// 事务视角下的最新版本（包含本事务尚未提交的写入）
    async fn get_latest(&mut self, urn: &Urn, aspect: &str) -> DomainResult<Option<AspectRecord>>;

    /// 追加下一个版本；当前最新版本与 `expected_prior` 不一致时返回 `VersionConflict`
    async fn insert_next_version(
        &mut self,
        write: AspectWrite,
        expected_prior: Option<Version>,
    ) -> DomainResult<AspectRecord>;

    /// 原子提交；若其他写者已先行提交则返回 `VersionConflict`，本事务的写入全部作废
    async fn commit(self: Box<Self>) -> DomainResult<Vec<AspectRecord>>;

    async fn rollback(self: Box<Self>) -> DomainResult<()>;
}

/// 切面存储
#[async_trait]
pub trait AspectStore: Send + Sync {
    async fn begin(&self, isolation: IsolationLevel) -> DomainResult<Box<dyn AspectTransaction>>;

    async fn get_latest(&self, urn: &Urn, aspect: &str) -> DomainResult<Option<AspectRecord>>;

    async fn get_version(
        &self,
        urn: &Urn,
        aspect: &str,
        version: Version,
    ) -> DomainResult<Option<AspectRecord>>;

    /// 历史版本，按版本号升序
    async fn list_versions(&self, urn: &Urn, aspect: &str) -> DomainResult<Vec<AspectRecord>>;
}

#[async_trait]
impl<T> AspectStore for Arc<T>
where
    T: AspectStore + ?Sized,
{
    async fn begin(&self, isolation: IsolationLevel) -> DomainResult<Box<dyn AspectTransaction>> {
        (**self).begin(isolation).await
    }

    async fn get_latest(&self, urn: &Urn, aspect: &str) -> DomainResult<Option<AspectRecord>> {
        (**self).get_latest(urn, aspect).await
    }

    async fn get_version(
        &self,
        urn: &Urn,
        aspect: &str,
        version: Version,
    ) -> DomainResult<Option<AspectRecord>> {
        (**self).get_version(urn, aspect, version).await
    }

    async fn list_versions(&self, urn: &Urn, aspect: &str) -> DomainResult<Vec<AspectRecord>> {
        (**self).list_versions(urn, aspect).await
    }
}
