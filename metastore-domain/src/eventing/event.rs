//! 切面变更事件（AspectChangeEvent）
//!
//! 每次已提交的写入对应一条变更通知，携带前后载荷、版本与审计信息，
//! 供下游消费者（搜索、血缘、通知等）订阅。
//!
use crate::aspect::{AspectRecord, AuditStamp, SystemMetadata};
use crate::urn::Urn;
use crate::value_object::Version;
use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Upsert,
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectChangeEvent {
    #[builder(default = Uuid::new_v4())]
    event_id: Uuid,
    #[builder(default = ChangeType::Upsert)]
    change_type: ChangeType,
    urn: Urn,
    #[builder(into)]
    entity_type: String,
    #[builder(into)]
    aspect_name: String,
    previous: Option<Value>,
    new: Value,
    previous_version: Option<Version>,
    version: Version,
    audit: AuditStamp,
    system_metadata: Option<SystemMetadata>,
}

impl AspectChangeEvent {
    /// 由已提交记录与其前一版本构造
    pub fn from_commit(
        entity_type: &str,
        record: &AspectRecord,
        previous: Option<&AspectRecord>,
    ) -> Self {
        Self::builder()
            .urn(record.urn().clone())
            .entity_type(entity_type)
            .aspect_name(record.aspect_name())
            .maybe_previous(previous.map(|p| p.payload().clone()))
            .new(record.payload().clone())
            .maybe_previous_version(previous.map(AspectRecord::version))
            .version(record.version())
            .audit(record.audit().clone())
            .maybe_system_metadata(record.system_metadata().cloned())
            .build()
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn change_type(&self) -> ChangeType {
        self.change_type
    }

    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn aspect_name(&self) -> &str {
        &self.aspect_name
    }

    pub fn previous(&self) -> Option<&Value> {
        self.previous.as_ref()
    }

    pub fn new_value(&self) -> &Value {
        &self.new
    }

    pub fn previous_version(&self) -> Option<Version> {
        self.previous_version
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn audit(&self) -> &AuditStamp {
        &self.audit
    }

    pub fn system_metadata(&self) -> Option<&SystemMetadata> {
        self.system_metadata.as_ref()
    }
}
