//! 切面（Aspect）与审计模型
//!
//! - `Aspect`：命名、可序列化的切面载荷（通常由 `#[aspect]` 宏实现）；
//! - `EntityKey`：键切面，其内容可确定性地推导出实体 urn（由 `#[entity_key]` 宏实现）；
//! - `AspectRecord`：切面在存储层的一个版本，附带审计戳与系统元数据。
//!
use crate::error::DomainResult;
use crate::registry::KeyAspectSpec;
use crate::urn::Urn;
use crate::value_object::Version;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// 类型化切面载荷
pub trait Aspect: Serialize + DeserializeOwned + Send + Sync {
    /// 切面名称（如 `subTypes`、`globalTags`）
    const NAME: &'static str;

    fn to_payload(&self) -> DomainResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn from_payload(payload: &Value) -> DomainResult<Self>
    where
        Self: Sized,
    {
        Ok(Self::deserialize(payload)?)
    }
}

/// 键切面：字段按声明顺序构成 urn 的键元组
pub trait EntityKey: Aspect {
    const ENTITY_TYPE: &'static str;
    const FIELDS: &'static [&'static str];

    fn to_urn(&self) -> DomainResult<Urn> {
        KeyAspectSpec::of::<Self>().derive_urn(Self::ENTITY_TYPE, &self.to_payload()?)
    }
}

/// 写入的执行主体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorType {
    User,
    Service,
}

/// 写入的执行主体，由入口层显式传入，不依赖任何全局认证上下文
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    actor_type: ActorType,
    id: String,
}

impl Actor {
    pub fn new(actor_type: ActorType, id: impl Into<String>) -> Self {
        Self {
            actor_type,
            id: id.into(),
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::new(ActorType::User, id)
    }

    pub fn service(id: impl Into<String>) -> Self {
        Self::new(ActorType::Service, id)
    }

    pub fn actor_type(&self) -> ActorType {
        self.actor_type
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 主体的 urn 形式，例如 `urn:li:corpuser:datahub`
    pub fn urn(&self) -> String {
        match self.actor_type {
            ActorType::User => format!("urn:li:corpuser:{}", self.id),
            ActorType::Service => format!("urn:li:service:{}", self.id),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.urn())
    }
}

/// 审计戳：写入时间与主体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStamp {
    time: DateTime<Utc>,
    actor: Actor,
}

impl AuditStamp {
    pub fn new(time: DateTime<Utc>, actor: Actor) -> Self {
        Self { time, actor }
    }

    pub fn now(actor: &Actor) -> Self {
        Self::new(Utc::now(), actor.clone())
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }
}

/// 系统元数据（摄取批次、最近观测时间等），随请求传入并与记录一同持久化
#[derive(Builder, Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetadata {
    /// 摄取运行 ID
    run_id: Option<String>,
    /// 源系统最近一次观测到该切面的时间
    last_observed: Option<DateTime<Utc>>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, String>,
}

impl SystemMetadata {
    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    pub fn last_observed(&self) -> Option<DateTime<Utc>> {
        self.last_observed
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

/// `(urn, aspect)` 键，版本序列的归属单位
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AspectKey {
    pub urn: Urn,
    pub aspect_name: String,
}

impl AspectKey {
    pub fn new(urn: Urn, aspect_name: impl Into<String>) -> Self {
        Self {
            urn,
            aspect_name: aspect_name.into(),
        }
    }
}

impl fmt::Display for AspectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.urn, self.aspect_name)
    }
}

/// 已提交的切面版本（提交后不可变）
#[derive(Debug, Clone, Builder, PartialEq, Serialize, Deserialize)]
pub struct AspectRecord {
    urn: Urn,
    aspect_name: String,
    version: Version,
    payload: Value,
    audit: AuditStamp,
    system_metadata: Option<SystemMetadata>,
}

impl AspectRecord {
    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    pub fn aspect_name(&self) -> &str {
        &self.aspect_name
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn audit(&self) -> &AuditStamp {
        &self.audit
    }

    pub fn system_metadata(&self) -> Option<&SystemMetadata> {
        self.system_metadata.as_ref()
    }

    pub fn key(&self) -> AspectKey {
        AspectKey::new(self.urn.clone(), self.aspect_name.clone())
    }

    /// 将载荷还原为类型化切面；名称不匹配时返回 `None`
    pub fn decode<A: Aspect>(&self) -> DomainResult<Option<A>> {
        if self.aspect_name != A::NAME {
            return Ok(None);
        }
        A::from_payload(&self.payload).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::well_known::{DatasetKey, FabricType, SubTypes};

    #[test]
    fn actor_urn_by_type() {
        assert_eq!(Actor::user("datahub").urn(), "urn:li:corpuser:datahub");
        assert_eq!(Actor::service("ingest").urn(), "urn:li:service:ingest");
    }

    #[test]
    fn typed_aspect_payload_uses_camel_case() {
        let sub = SubTypes {
            type_names: vec!["view".into()],
        };
        let payload = sub.to_payload().unwrap();
        assert_eq!(payload, serde_json::json!({ "typeNames": ["view"] }));
        assert_eq!(SubTypes::from_payload(&payload).unwrap(), sub);
    }

    #[test]
    fn entity_key_derives_urn() {
        let key = DatasetKey {
            platform: "urn:li:dataPlatform:platform".into(),
            name: "name".into(),
            origin: FabricType::Prod,
        };
        assert_eq!(
            key.to_urn().unwrap().as_str(),
            "urn:li:dataset:(urn:li:dataPlatform:platform,name,PROD)"
        );
    }

    #[test]
    fn record_decodes_only_matching_aspect() {
        let urn = Urn::parse("urn:li:dataset:(urn:li:dataPlatform:p,n,PROD)").unwrap();
        let record = AspectRecord::builder()
            .urn(urn)
            .aspect_name(SubTypes::NAME.to_string())
            .version(Version::FIRST)
            .payload(serde_json::json!({ "typeNames": ["view"] }))
            .audit(AuditStamp::now(&Actor::user("datahub")))
            .build();

        let decoded: Option<SubTypes> = record.decode().unwrap();
        assert_eq!(decoded.map(|s| s.type_names), Some(vec!["view".to_string()]));
        let other: Option<DatasetKey> = record.decode().unwrap();
        assert!(other.is_none());
    }
}
