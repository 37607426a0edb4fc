//! 内存版切面存储（InMemoryAspectStore）
//!
//! 事务内的写入先缓冲在事务本地，提交时在写锁下统一校验前置版本并原子追加；
//! 非 `ReadCommitted` 隔离级别下同时校验事务读过的键未被并发改写。
//! 典型用途：测试环境、示例与本地开发。
//!
use super::{AspectStore, AspectTransaction, AspectWrite, IsolationLevel};
use crate::aspect::{AspectKey, AspectRecord};
use crate::error::{DomainError, DomainResult as Result};
use crate::urn::Urn;
use crate::value_object::Version;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type VersionTable = HashMap<AspectKey, Vec<AspectRecord>>;

/// 克隆后共享同一份底层数据
#[derive(Clone, Default)]
pub struct InMemoryAspectStore {
    table: Arc<RwLock<VersionTable>>,
}

impl InMemoryAspectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已存在版本的 `(urn, aspect)` 数量
    pub async fn key_count(&self) -> usize {
        self.table.read().await.len()
    }
}

fn latest_version(table: &VersionTable, key: &AspectKey) -> Option<Version> {
    table
        .get(key)
        .and_then(|versions| versions.last())
        .map(AspectRecord::version)
}

fn conflict(key: &AspectKey, expected: Option<Version>, actual: Option<Version>) -> DomainError {
    DomainError::VersionConflict {
        urn: key.urn.to_string(),
        aspect: key.aspect_name.clone(),
        expected: expected.map(u64::from),
        actual: actual.map(u64::from),
    }
}

#[async_trait]
impl AspectStore for InMemoryAspectStore {
    async fn begin(&self, isolation: IsolationLevel) -> Result<Box<dyn AspectTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            table: self.table.clone(),
            isolation,
            reads: HashMap::new(),
            pending: Vec::new(),
        }))
    }

    async fn get_latest(&self, urn: &Urn, aspect: &str) -> Result<Option<AspectRecord>> {
        let key = AspectKey::new(urn.clone(), aspect);
        let table = self.table.read().await;
        Ok(table.get(&key).and_then(|v| v.last()).cloned())
    }

    async fn get_version(
        &self,
        urn: &Urn,
        aspect: &str,
        version: Version,
    ) -> Result<Option<AspectRecord>> {
        let key = AspectKey::new(urn.clone(), aspect);
        let table = self.table.read().await;
        // 版本号自 0 起连续，可直接按下标取
        Ok(table
            .get(&key)
            .and_then(|v| v.get(version.value() as usize))
            .cloned())
    }

    async fn list_versions(&self, urn: &Urn, aspect: &str) -> Result<Vec<AspectRecord>> {
        let key = AspectKey::new(urn.clone(), aspect);
        let table = self.table.read().await;
        Ok(table.get(&key).cloned().unwrap_or_default())
    }
}

struct PendingWrite {
    key: AspectKey,
    expected_prior: Option<Version>,
    record: AspectRecord,
}

struct InMemoryTransaction {
    table: Arc<RwLock<VersionTable>>,
    isolation: IsolationLevel,
    /// 首次读取时看到的已提交版本
    reads: HashMap<AspectKey, Option<Version>>,
    pending: Vec<PendingWrite>,
}

impl InMemoryTransaction {
    fn pending_latest(&self, key: &AspectKey) -> Option<&AspectRecord> {
        self.pending
            .iter()
            .rev()
            .find(|w| &w.key == key)
            .map(|w| &w.record)
    }

    async fn committed_latest(&mut self, key: &AspectKey) -> Option<AspectRecord> {
        let record = {
            let table = self.table.read().await;
            table.get(key).and_then(|v| v.last()).cloned()
        };
        self.reads
            .entry(key.clone())
            .or_insert_with(|| record.as_ref().map(AspectRecord::version));
        record
    }

    async fn view_latest(&mut self, key: &AspectKey) -> Option<AspectRecord> {
        if let Some(record) = self.pending_latest(key) {
            return Some(record.clone());
        }
        self.committed_latest(key).await
    }
}

#[async_trait]
impl AspectTransaction for InMemoryTransaction {
    async fn get_latest(&mut self, urn: &Urn, aspect: &str) -> Result<Option<AspectRecord>> {
        let key = AspectKey::new(urn.clone(), aspect);
        Ok(self.view_latest(&key).await)
    }

    async fn insert_next_version(
        &mut self,
        write: AspectWrite,
        expected_prior: Option<Version>,
    ) -> Result<AspectRecord> {
        let key = write.key();
        let actual = self.view_latest(&key).await.map(|r| r.version());
        if actual != expected_prior {
            return Err(conflict(&key, expected_prior, actual));
        }

        let record = write.into_record(Version::after(expected_prior));
        self.pending.push(PendingWrite {
            key,
            expected_prior,
            record: record.clone(),
        });
        Ok(record)
    }

    async fn commit(self: Box<Self>) -> Result<Vec<AspectRecord>> {
        let this = *self;
        let mut table = this.table.write().await;

        if this.isolation.validates_reads() {
            for (key, seen) in &this.reads {
                let actual = latest_version(&table, key);
                if actual != *seen {
                    return Err(conflict(key, *seen, actual));
                }
            }
        }

        // 先整体校验，再统一追加，保证全有或全无
        let mut heads: HashMap<&AspectKey, Option<Version>> = HashMap::new();
        for write in &this.pending {
            let head = heads
                .entry(&write.key)
                .or_insert_with(|| latest_version(&table, &write.key));
            if *head != write.expected_prior {
                return Err(conflict(&write.key, write.expected_prior, *head));
            }
            *head = Some(write.record.version());
        }

        let mut committed = Vec::with_capacity(this.pending.len());
        for write in this.pending {
            table
                .entry(write.key)
                .or_default()
                .push(write.record.clone());
            committed.push(write.record);
        }
        Ok(committed)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::{Actor, AuditStamp};
    use serde_json::json;

    fn urn() -> Urn {
        Urn::parse("urn:li:tag:pii").unwrap()
    }

    fn write(payload: serde_json::Value) -> AspectWrite {
        AspectWrite::builder()
            .urn(urn())
            .aspect_name("status".to_string())
            .payload(payload)
            .audit(AuditStamp::now(&Actor::user("datahub")))
            .build()
    }

    #[tokio::test]
    async fn versions_start_at_zero_and_advance() {
        let store = InMemoryAspectStore::new();
        for (i, removed) in [false, true, false].into_iter().enumerate() {
            let mut txn = store.begin(IsolationLevel::RepeatableRead).await.unwrap();
            let prior = txn
                .get_latest(&urn(), "status")
                .await
                .unwrap()
                .map(|r| r.version());
            let record = txn
                .insert_next_version(write(json!({ "removed": removed })), prior)
                .await
                .unwrap();
            assert_eq!(record.version().value(), i as u64);
            txn.commit().await.unwrap();
        }

        let history = store.list_versions(&urn(), "status").await.unwrap();
        assert_eq!(history.len(), 3);
        let v1 = store
            .get_version(&urn(), "status", Version::from_value(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(v1.payload(), &json!({ "removed": true }));
        assert_eq!(
            store.get_latest(&urn(), "status").await.unwrap().unwrap().version(),
            Version::from_value(2)
        );
    }

    #[tokio::test]
    async fn stale_expected_version_is_rejected_on_insert() {
        let store = InMemoryAspectStore::new();
        let mut txn = store.begin(IsolationLevel::ReadCommitted).await.unwrap();
        txn.insert_next_version(write(json!({ "removed": false })), None)
            .await
            .unwrap();
        let err = txn
            .insert_next_version(write(json!({ "removed": true })), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::VersionConflict {
                expected: None,
                actual: Some(0),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn concurrent_commit_loses_with_conflict() {
        let store = InMemoryAspectStore::new();
        let mut first = store.begin(IsolationLevel::RepeatableRead).await.unwrap();
        let mut second = store.begin(IsolationLevel::RepeatableRead).await.unwrap();

        first
            .insert_next_version(write(json!({ "removed": false })), None)
            .await
            .unwrap();
        second
            .insert_next_version(write(json!({ "removed": true })), None)
            .await
            .unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.list_versions(&urn(), "status").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rollback_discards_pending_writes() {
        let store = InMemoryAspectStore::new();
        let mut txn = store.begin(IsolationLevel::Serializable).await.unwrap();
        txn.insert_next_version(write(json!({ "removed": false })), None)
            .await
            .unwrap();
        txn.rollback().await.unwrap();
        assert!(store.get_latest(&urn(), "status").await.unwrap().is_none());
        assert_eq!(store.key_count().await, 0);
    }
}
