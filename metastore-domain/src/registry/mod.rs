//! 实体注册表（registry）
//!
//! 只读的结构契约查询：给定实体类型与切面名，回答
//! - 该切面对该实体类型是否合法；
//! - 该切面是否为键切面；
//! - 如何由键切面载荷推导 urn（以及反向由 urn 还原键切面）。
//!
//! 请求期间无副作用，可被任意并发读取。
//!
mod spec;
mod static_registry;

pub use spec::{EntitySpec, KeyAspectSpec};
pub use static_registry::{StaticEntityRegistry, StaticEntityRegistryBuilder};

use crate::error::{DomainError, DomainResult};
use crate::urn::Urn;
use serde_json::Value;
use std::sync::Arc;

/// 实体注册表协议
pub trait EntityRegistry: Send + Sync {
    /// 未注册的实体类型返回 `UnknownEntityType`
    fn entity_spec(&self, entity_type: &str) -> DomainResult<&EntitySpec>;

    fn is_valid_aspect(&self, entity_type: &str, aspect: &str) -> DomainResult<bool> {
        Ok(self.entity_spec(entity_type)?.has_aspect(aspect))
    }

    fn is_key_aspect(&self, entity_type: &str, aspect: &str) -> DomainResult<bool> {
        Ok(self.entity_spec(entity_type)?.is_key_aspect(aspect))
    }

    /// 校验切面名，未注册的切面返回 `UnknownAspect`
    fn validate_aspect(&self, entity_type: &str, aspect: &str) -> DomainResult<()> {
        if self.is_valid_aspect(entity_type, aspect)? {
            Ok(())
        } else {
            Err(DomainError::UnknownAspect {
                entity_type: entity_type.to_string(),
                aspect: aspect.to_string(),
            })
        }
    }

    fn resolve_key_urn(&self, entity_type: &str, key_payload: &Value) -> DomainResult<Urn> {
        self.entity_spec(entity_type)?
            .key()
            .derive_urn(entity_type, key_payload)
    }

    fn key_from_urn(&self, urn: &Urn) -> DomainResult<Value> {
        self.entity_spec(urn.entity_type())?.key().key_from_urn(urn)
    }
}

impl<T> EntityRegistry for Arc<T>
where
    T: EntityRegistry + ?Sized,
{
    fn entity_spec(&self, entity_type: &str) -> DomainResult<&EntitySpec> {
        (**self).entity_spec(entity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::{Aspect, EntityKey};
    use crate::well_known::{DatasetKey, FabricType, SubTypes, TagKey};
    use serde_json::json;

    fn dataset_key() -> Value {
        json!({
            "platform": "urn:li:dataPlatform:platform",
            "name": "name",
            "origin": "PROD"
        })
    }

    #[test]
    fn well_known_lookups() {
        let registry = StaticEntityRegistry::well_known();
        assert!(registry.is_valid_aspect("dataset", SubTypes::NAME).unwrap());
        assert!(registry.is_valid_aspect("dataset", DatasetKey::NAME).unwrap());
        assert!(!registry.is_valid_aspect("dataset", "chartInfo").unwrap());
        assert!(registry.is_key_aspect("dataset", "datasetKey").unwrap());
        assert!(!registry.is_key_aspect("dataset", "subTypes").unwrap());
    }

    #[test]
    fn unknown_type_and_aspect_errors() {
        let registry = StaticEntityRegistry::well_known();
        assert!(matches!(
            registry.is_valid_aspect("notAType", "subTypes"),
            Err(DomainError::UnknownEntityType { .. })
        ));
        assert!(matches!(
            registry.validate_aspect("dataset", "chartInfo"),
            Err(DomainError::UnknownAspect { .. })
        ));
        assert!(registry.validate_aspect("dataset", "globalTags").is_ok());
    }

    #[test]
    fn key_urn_derivation_is_deterministic() {
        let registry = StaticEntityRegistry::well_known();
        let a = registry.resolve_key_urn("dataset", &dataset_key()).unwrap();
        let b = registry.resolve_key_urn("dataset", &dataset_key()).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.as_str(),
            "urn:li:dataset:(urn:li:dataPlatform:platform,name,PROD)"
        );

        // 字段顺序由契约决定，而不是载荷中的键顺序
        let reordered = json!({
            "origin": "PROD",
            "name": "name",
            "platform": "urn:li:dataPlatform:platform"
        });
        assert_eq!(registry.resolve_key_urn("dataset", &reordered).unwrap(), a);

        let typed = DatasetKey {
            platform: "urn:li:dataPlatform:platform".into(),
            name: "name".into(),
            origin: FabricType::Prod,
        };
        assert_eq!(typed.to_urn().unwrap(), a);
    }

    #[test]
    fn key_from_urn_inverts_derivation() {
        let registry = StaticEntityRegistry::well_known();
        let urn = registry.resolve_key_urn("dataset", &dataset_key()).unwrap();
        assert_eq!(registry.key_from_urn(&urn).unwrap(), dataset_key());

        let tag = Urn::parse("urn:li:tag:sometag").unwrap();
        assert_eq!(registry.key_from_urn(&tag).unwrap(), json!({ "name": "sometag" }));
        let decoded = TagKey::from_payload(&registry.key_from_urn(&tag).unwrap()).unwrap();
        assert_eq!(decoded.to_urn().unwrap(), tag);
    }

    #[test]
    fn escaped_key_fields_round_trip() {
        let registry = StaticEntityRegistry::well_known();
        let payload = json!({
            "platform": "urn:li:dataPlatform:hive",
            "name": "db.t,v2 (old)",
            "origin": "PROD"
        });
        let urn = registry.resolve_key_urn("dataset", &payload).unwrap();
        assert_eq!(urn.key_parts().len(), 3);
        assert_eq!(registry.key_from_urn(&urn).unwrap(), payload);

        let shifted = json!({
            "platform": "urn:li:dataPlatform:hive,db.t",
            "name": "v2 (old)",
            "origin": "PROD"
        });
        assert_ne!(registry.resolve_key_urn("dataset", &shifted).unwrap(), urn);
    }

    #[test]
    fn incomplete_key_payload_is_rejected() {
        let registry = StaticEntityRegistry::well_known();
        for payload in [
            json!({ "platform": "urn:li:dataPlatform:p", "name": "n" }),
            json!({ "platform": "urn:li:dataPlatform:p", "name": "", "origin": "PROD" }),
            json!({ "platform": {"nested": true}, "name": "n", "origin": "PROD" }),
            json!(["not", "an", "object"]),
        ] {
            assert!(matches!(
                registry.resolve_key_urn("dataset", &payload),
                Err(DomainError::InvalidKeyAspect { .. })
            ));
        }
    }

    #[test]
    fn builder_registers_custom_entity() {
        let registry = StaticEntityRegistry::builder()
            .entity(EntitySpec::new(
                "chart",
                KeyAspectSpec::new("chartKey", ["dashboardTool", "chartId"]),
                ["chartInfo"],
            ))
            .build();
        let urn = registry
            .resolve_key_urn("chart", &json!({ "dashboardTool": "looker", "chartId": 7 }))
            .unwrap();
        assert_eq!(urn.as_str(), "urn:li:chart:(looker,7)");
        assert!(registry.is_key_aspect("chart", "chartKey").unwrap());
        assert!(registry.entity_spec("dataset").is_err());
    }
}
