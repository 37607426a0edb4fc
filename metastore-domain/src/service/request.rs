use crate::aspect::{Aspect, AuditStamp, EntityKey, SystemMetadata};
use crate::error::{DomainError, DomainResult, ErrorKind};
use crate::urn::Urn;
use crate::value_object::Version;
use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// 单条 upsert 请求。`entity_urn` 与 `entity_key_aspect` 必须且只能给出其一。
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRequest {
    #[builder(into)]
    pub entity_type: String,
    #[builder(into)]
    pub aspect_name: String,
    pub aspect: Value,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_urn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_key_aspect: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_metadata: Option<SystemMetadata>,
}

impl UpsertRequest {
    /// 以 urn 定位实体，实体类型取自 urn
    pub fn for_urn<A: Aspect>(urn: &Urn, aspect: &A) -> DomainResult<Self> {
        Ok(Self::builder()
            .entity_type(urn.entity_type())
            .aspect_name(A::NAME)
            .aspect(aspect.to_payload()?)
            .entity_urn(urn.as_str())
            .build())
    }

    /// 以键切面定位实体
    pub fn for_key<K: EntityKey, A: Aspect>(key: &K, aspect: &A) -> DomainResult<Self> {
        Ok(Self::builder()
            .entity_type(K::ENTITY_TYPE)
            .aspect_name(A::NAME)
            .aspect(aspect.to_payload()?)
            .entity_key_aspect(key.to_payload()?)
            .build())
    }

    pub fn with_system_metadata(mut self, system_metadata: SystemMetadata) -> Self {
        self.system_metadata = Some(system_metadata);
        self
    }
}

/// 单条写入成功的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub urn: Urn,
    pub aspect_name: String,
    pub previous: Option<Value>,
    pub new: Value,
    pub version: Version,
    /// 内容与前一版本不同（首次写入恒为 true）
    pub changed: bool,
    pub audit: AuditStamp,
    /// 事务实际尝试次数（1 表示未发生重试）
    pub attempts: usize,
}

/// 单条写入失败的分类与描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<DomainError> for ItemFailure {
    fn from(err: DomainError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

pub type ItemOutcome = Result<UpdateResult, ItemFailure>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::well_known::{DatasetKey, FabricType, SubTypes};
    use serde_json::json;

    #[test]
    fn typed_constructors_fill_identity() {
        let sub = SubTypes {
            type_names: vec!["view".into()],
        };
        let key = DatasetKey {
            platform: "urn:li:dataPlatform:hive".into(),
            name: "db.t".into(),
            origin: FabricType::Prod,
        };

        let by_key = UpsertRequest::for_key(&key, &sub).unwrap();
        assert_eq!(by_key.entity_type, "dataset");
        assert_eq!(by_key.aspect_name, "subTypes");
        assert!(by_key.entity_urn.is_none());
        assert_eq!(
            by_key.entity_key_aspect,
            Some(json!({ "platform": "urn:li:dataPlatform:hive", "name": "db.t", "origin": "PROD" }))
        );

        let urn = key.to_urn().unwrap();
        let by_urn = UpsertRequest::for_urn(&urn, &sub).unwrap();
        assert_eq!(by_urn.entity_urn.as_deref(), Some(urn.as_str()));
        assert_eq!(by_urn.aspect, json!({ "typeNames": ["view"] }));
    }

    #[test]
    fn request_deserializes_from_camel_case() {
        let req: UpsertRequest = serde_json::from_value(json!({
            "entityType": "tag",
            "aspectName": "status",
            "aspect": { "removed": false },
            "entityUrn": "urn:li:tag:pii"
        }))
        .unwrap();
        assert_eq!(req.entity_urn.as_deref(), Some("urn:li:tag:pii"));
        assert!(req.entity_key_aspect.is_none());
    }

    #[test]
    fn failure_carries_kind_and_message() {
        let failure = ItemFailure::from(DomainError::UnknownEntityType {
            entity_type: "notAType".into(),
        });
        assert_eq!(failure.kind, ErrorKind::UnknownEntityType);
        assert!(failure.message.contains("notAType"));
    }
}
