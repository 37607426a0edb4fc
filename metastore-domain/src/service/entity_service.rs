//! 实体服务（EntityService）
//!
//! 批量 upsert 的编排者。逐条执行：
//! 校验 → 解析身份 → 带重试的事务写入 → 提交后扇出 → 汇总结果。
//! 任一条目的失败不会回滚或阻塞其他条目，结果与输入一一对应且保持顺序。
//!
use super::{ItemFailure, ItemOutcome, UpdateResult, UpsertRequest};
use crate::aspect::{Actor, Aspect, AspectRecord, AuditStamp, SystemMetadata};
use crate::config::MetastoreConfig;
use crate::error::{DomainError, DomainResult};
use crate::fanout::{FanoutDispatcher, FanoutJob, FanoutStats};
use crate::persist::{AspectStore, AspectStoreExt, AspectTransaction, AspectWrite, TransactionalWork};
use crate::registry::EntityRegistry;
use crate::urn::Urn;
use crate::value_object::Version;
use async_trait::async_trait;
use bon::Builder;
use futures_util::{StreamExt, stream};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Builder)]
pub struct EntityService {
    registry: Arc<dyn EntityRegistry>,
    store: Arc<dyn AspectStore>,
    fanout: FanoutDispatcher,
    #[builder(default)]
    config: MetastoreConfig,
}

/// 校验与身份解析之后、写入之前的请求
struct PreparedWrite {
    entity_type: String,
    urn: Urn,
    aspect_name: String,
    payload: Value,
    system_metadata: Option<SystemMetadata>,
    /// 需要随首次写入一并落盘的键切面
    key_aspect: Option<(String, Value)>,
}

impl EntityService {
    pub fn registry(&self) -> &Arc<dyn EntityRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &MetastoreConfig {
        &self.config
    }

    pub fn fanout_stats(&self) -> Arc<FanoutStats> {
        self.fanout.stats()
    }

    /// 批量写入：每条请求产生一个结果，顺序与输入一致。
    /// 仅批次整体被拒绝（超过 `limits.max_batch_size`）时返回 `Err`。
    #[tracing::instrument(skip_all, fields(batch_size = requests.len(), actor = %actor))]
    pub async fn upsert_batch(
        &self,
        requests: Vec<UpsertRequest>,
        actor: &Actor,
    ) -> DomainResult<Vec<ItemOutcome>> {
        self.check_batch_size(requests.len())?;

        let concurrency = self.config.service.batch_concurrency.max(1);
        let outcomes: Vec<ItemOutcome> = stream::iter(requests.into_iter().enumerate())
            .map(|(index, request)| async move {
                match self.process(request, actor).await {
                    Ok(result) => Ok(result),
                    Err(err) => {
                        warn!(index, kind = ?err.kind(), error = %err, "upsert item failed");
                        Err(ItemFailure::from(err))
                    }
                }
            })
            .buffered(concurrency)
            .collect()
            .await;

        let committed = outcomes.iter().filter(|o| o.is_ok()).count();
        info!(
            committed,
            failed = outcomes.len() - committed,
            "upsert batch finished"
        );
        Ok(outcomes)
    }

    /// 单条写入（等价于只含一条请求的批次）
    pub async fn upsert(&self, request: UpsertRequest, actor: &Actor) -> DomainResult<UpdateResult> {
        self.check_batch_size(1)?;
        self.process(request, actor).await
    }

    fn check_batch_size(&self, size: usize) -> DomainResult<()> {
        let max = self.config.limits.max_batch_size;
        if size > max {
            warn!(size, max, "batch rejected");
            return Err(DomainError::BatchTooLarge { size, max });
        }
        Ok(())
    }

    async fn process(&self, request: UpsertRequest, actor: &Actor) -> DomainResult<UpdateResult> {
        let prepared = self.prepare(request)?;
        let audit = AuditStamp::now(actor);

        let work = UpsertWork {
            prepared: &prepared,
            audit: &audit,
        };
        let committed = self
            .store
            .run_in_transaction_with_retry(&work, &self.config.retry.policy())
            .await?;
        let attempts = committed.attempts;
        let UpsertCommit {
            previous,
            record,
            key_record,
        } = committed.value;

        debug!(
            urn = %record.urn(),
            aspect = record.aspect_name(),
            version = %record.version(),
            attempts,
            "aspect committed"
        );

        if let Some(key_record) = &key_record {
            self.fanout
                .dispatch(FanoutJob::from_commit(&prepared.entity_type, key_record, None))
                .await;
        }
        self.fanout
            .dispatch(FanoutJob::from_commit(
                &prepared.entity_type,
                &record,
                previous.as_ref(),
            ))
            .await;

        let changed = previous
            .as_ref()
            .is_none_or(|p| p.payload() != record.payload());
        Ok(UpdateResult {
            urn: record.urn().clone(),
            aspect_name: record.aspect_name().to_string(),
            previous: previous.map(|p| p.payload().clone()),
            new: record.payload().clone(),
            version: record.version(),
            changed,
            audit,
            attempts,
        })
    }

    /// 注册表校验与身份解析，不触碰存储
    fn prepare(&self, request: UpsertRequest) -> DomainResult<PreparedWrite> {
        let UpsertRequest {
            entity_type,
            aspect_name,
            aspect,
            entity_urn,
            entity_key_aspect,
            system_metadata,
        } = request;

        let spec = self.registry.entity_spec(&entity_type)?;
        self.registry.validate_aspect(&entity_type, &aspect_name)?;
        self.check_payload(&aspect_name, &aspect)?;

        let urn = match (entity_urn, entity_key_aspect) {
            (Some(_), Some(_)) => {
                return Err(DomainError::ambiguous(
                    "both entity urn and entity key aspect were supplied",
                ));
            }
            (None, None) => {
                return Err(DomainError::ambiguous(
                    "neither entity urn nor entity key aspect was supplied",
                ));
            }
            (Some(raw), None) => Urn::parse(raw)?,
            (None, Some(key)) => self.registry.resolve_key_urn(&entity_type, &key)?,
        };

        if urn.entity_type() != entity_type {
            return Err(DomainError::ambiguous(format!(
                "urn {urn} is of type {}, request targets {entity_type}",
                urn.entity_type()
            )));
        }

        let writes_key = spec.is_key_aspect(&aspect_name);
        if writes_key {
            let derived = spec.key().derive_urn(&entity_type, &aspect)?;
            if derived != urn {
                return Err(DomainError::ambiguous(format!(
                    "key aspect identifies {derived}, request targets {urn}"
                )));
            }
        }

        let key_aspect = if self.config.service.write_key_aspect && !writes_key {
            Some((
                spec.key().aspect_name().to_string(),
                spec.key().key_from_urn(&urn)?,
            ))
        } else {
            None
        };

        Ok(PreparedWrite {
            entity_type,
            urn,
            aspect_name,
            payload: aspect,
            system_metadata,
            key_aspect,
        })
    }

    fn check_payload(&self, aspect_name: &str, payload: &Value) -> DomainResult<()> {
        let invalid = |reason: String| DomainError::InvalidAspect {
            aspect: aspect_name.to_string(),
            reason,
        };
        if !payload.is_object() {
            return Err(invalid("payload must be a JSON object".to_string()));
        }
        let size = serde_json::to_vec(payload)?.len();
        let max = self.config.limits.max_aspect_bytes;
        if size > max {
            return Err(invalid(format!("payload is {size} bytes, limit is {max}")));
        }
        Ok(())
    }

    pub async fn get_aspect(&self, urn: &Urn, aspect: &str) -> DomainResult<Option<AspectRecord>> {
        self.registry.validate_aspect(urn.entity_type(), aspect)?;
        self.store.get_latest(urn, aspect).await
    }

    /// 读取最新版本并还原为类型化切面
    pub async fn get_typed<A: Aspect>(&self, urn: &Urn) -> DomainResult<Option<A>> {
        match self.get_aspect(urn, A::NAME).await? {
            Some(record) => record.decode(),
            None => Ok(None),
        }
    }

    pub async fn get_aspect_version(
        &self,
        urn: &Urn,
        aspect: &str,
        version: Version,
    ) -> DomainResult<Option<AspectRecord>> {
        self.registry.validate_aspect(urn.entity_type(), aspect)?;
        self.store.get_version(urn, aspect, version).await
    }

    pub async fn aspect_history(&self, urn: &Urn, aspect: &str) -> DomainResult<Vec<AspectRecord>> {
        self.registry.validate_aspect(urn.entity_type(), aspect)?;
        self.store.list_versions(urn, aspect).await
    }
}

struct UpsertCommit {
    previous: Option<AspectRecord>,
    record: AspectRecord,
    key_record: Option<AspectRecord>,
}

/// 一次写入尝试：读最新版本、覆盖写入下一版本，必要时补写键切面
struct UpsertWork<'a> {
    prepared: &'a PreparedWrite,
    audit: &'a AuditStamp,
}

impl UpsertWork<'_> {
    fn write(&self, aspect_name: &str, payload: &Value) -> AspectWrite {
        AspectWrite::builder()
            .urn(self.prepared.urn.clone())
            .aspect_name(aspect_name.to_string())
            .payload(payload.clone())
            .audit(self.audit.clone())
            .maybe_system_metadata(self.prepared.system_metadata.clone())
            .build()
    }
}

#[async_trait]
impl<'a> TransactionalWork for UpsertWork<'a> {
    type Output = UpsertCommit;

    async fn attempt(&self, txn: &mut dyn AspectTransaction) -> DomainResult<UpsertCommit> {
        let prepared = self.prepared;
        let previous = txn.get_latest(&prepared.urn, &prepared.aspect_name).await?;
        let record = txn
            .insert_next_version(
                self.write(&prepared.aspect_name, &prepared.payload),
                previous.as_ref().map(AspectRecord::version),
            )
            .await?;

        let mut key_record = None;
        if let Some((key_name, key_payload)) = &prepared.key_aspect {
            if txn.get_latest(&prepared.urn, key_name).await?.is_none() {
                key_record = Some(
                    txn.insert_next_version(self.write(key_name, key_payload), None)
                        .await?,
                );
            }
        }

        Ok(UpsertCommit {
            previous,
            record,
            key_record,
        })
    }
}
