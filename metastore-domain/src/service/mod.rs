//! 实体服务层（service）
//!
//! - `UpsertRequest`：单条写入请求（urn 或键切面二选一）；
//! - `EntityService`：批量写入编排与只读查询；
//! - `UpdateResult` / `ItemFailure`：逐条结果。
//!
mod entity_service;
mod request;

pub use entity_service::{EntityService, EntityServiceBuilder};
pub use request::{ItemFailure, ItemOutcome, UpdateResult, UpsertRequest};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::{Actor, AspectRecord};
    use crate::config::MetastoreConfig;
    use crate::error::{DomainError, ErrorKind};
    use crate::eventing::InMemoryEventProducer;
    use crate::fanout::FanoutEngine;
    use crate::index::InMemoryIndex;
    use crate::persist::InMemoryAspectStore;
    use crate::registry::StaticEntityRegistry;
    use crate::urn::Urn;
    use serde_json::json;
    use std::sync::Arc;

    const DATASET: &str = "urn:li:dataset:(urn:li:dataPlatform:platform,name,PROD)";

    fn service(config: MetastoreConfig) -> (EntityService, InMemoryAspectStore) {
        let store = InMemoryAspectStore::new();
        let engine = FanoutEngine::builder()
            .index(Arc::new(InMemoryIndex::new()))
            .producer(Arc::new(InMemoryEventProducer::default()))
            .build();
        let service = EntityService::builder()
            .registry(Arc::new(StaticEntityRegistry::well_known()))
            .store(Arc::new(store.clone()))
            .fanout(engine.inline())
            .config(config)
            .build();
        (service, store)
    }

    fn sub_types(urn: Option<&str>, key: Option<serde_json::Value>) -> UpsertRequest {
        UpsertRequest::builder()
            .entity_type("dataset")
            .aspect_name("subTypes")
            .aspect(json!({ "typeNames": ["view"] }))
            .maybe_entity_urn(urn)
            .maybe_entity_key_aspect(key)
            .build()
    }

    #[tokio::test]
    async fn identity_must_be_exactly_one_of_urn_or_key() {
        let (service, store) = service(MetastoreConfig::default());
        let actor = Actor::user("datahub");
        let key = json!({ "platform": "urn:li:dataPlatform:platform", "name": "name", "origin": "PROD" });

        let outcomes = service
            .upsert_batch(
                vec![
                    sub_types(Some(DATASET), Some(key.clone())),
                    sub_types(None, None),
                    sub_types(Some("urn:li:tag:pii"), None),
                    sub_types(Some("not-a-urn"), None),
                ],
                &actor,
            )
            .await
            .unwrap();

        for outcome in &outcomes {
            assert_eq!(
                outcome.as_ref().unwrap_err().kind,
                ErrorKind::AmbiguousIdentity
            );
        }
        assert_eq!(store.key_count().await, 0);
    }

    #[tokio::test]
    async fn key_aspect_payload_must_match_target_urn() {
        let (service, _) = service(MetastoreConfig::default());
        let request = UpsertRequest::builder()
            .entity_type("dataset")
            .aspect_name("datasetKey")
            .aspect(json!({ "platform": "urn:li:dataPlatform:other", "name": "name", "origin": "PROD" }))
            .entity_urn(DATASET)
            .build();
        let err = service
            .upsert(request, &Actor::user("datahub"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousIdentity);
    }

    #[tokio::test]
    async fn payload_shape_and_size_are_checked() {
        let mut config = MetastoreConfig::default();
        config.limits.max_aspect_bytes = 32;
        let (service, _) = service(config);
        let actor = Actor::user("datahub");

        let mut not_object = sub_types(Some(DATASET), None);
        not_object.aspect = json!(["view"]);
        let mut too_big = sub_types(Some(DATASET), None);
        too_big.aspect = json!({ "typeNames": ["a-very-long-sub-type-name-that-overflows"] });

        let outcomes = service
            .upsert_batch(vec![not_object, too_big], &actor)
            .await
            .unwrap();
        assert!(outcomes
            .iter()
            .all(|o| o.as_ref().unwrap_err().kind == ErrorKind::InvalidAspect));
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_whole() {
        let mut config = MetastoreConfig::default();
        config.limits.max_batch_size = 2;
        let (service, store) = service(config);

        let err = service
            .upsert_batch(
                vec![
                    sub_types(Some(DATASET), None),
                    sub_types(Some(DATASET), None),
                    sub_types(Some(DATASET), None),
                ],
                &Actor::user("datahub"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::BatchTooLarge { size: 3, max: 2 }));
        assert_eq!(store.key_count().await, 0);
    }

    #[tokio::test]
    async fn key_aspect_is_written_once_with_the_first_aspect() {
        let (service, _) = service(MetastoreConfig::default());
        let actor = Actor::user("datahub");
        let urn = Urn::parse(DATASET).unwrap();

        service
            .upsert(sub_types(Some(DATASET), None), &actor)
            .await
            .unwrap();
        service
            .upsert(sub_types(Some(DATASET), None), &actor)
            .await
            .unwrap();

        let history: Vec<AspectRecord> = service.aspect_history(&urn, "datasetKey").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(
            history[0].payload(),
            &json!({ "platform": "urn:li:dataPlatform:platform", "name": "name", "origin": "PROD" })
        );
    }

    #[tokio::test]
    async fn key_aspect_write_can_be_disabled() {
        let mut config = MetastoreConfig::default();
        config.service.write_key_aspect = false;
        let (service, store) = service(config);

        service
            .upsert(sub_types(Some(DATASET), None), &Actor::user("datahub"))
            .await
            .unwrap();
        assert_eq!(store.key_count().await, 1);
    }

    #[tokio::test]
    async fn reads_validate_aspect_names() {
        let (service, _) = service(MetastoreConfig::default());
        let urn = Urn::parse(DATASET).unwrap();
        assert!(matches!(
            service.get_aspect(&urn, "chartInfo").await,
            Err(DomainError::UnknownAspect { .. })
        ));
        assert!(service.get_aspect(&urn, "subTypes").await.unwrap().is_none());
    }
}
