/// 数据集摄取示例
/// 演示一次批量 upsert：以 urn 与键切面两种方式写入视图属性、子类型、画像、模式与术语，
/// 并在后台扇出模式下观察索引与变更事件
use anyhow::Result as AnyResult;
use futures_util::StreamExt;
use metastore_domain::aspect::{Actor, Aspect, EntityKey, SystemMetadata};
use metastore_domain::config::{FanoutMode, MetastoreConfig};
use metastore_domain::eventing::InMemoryEventProducer;
use metastore_domain::fanout::FanoutEngine;
use metastore_domain::index::InMemoryIndex;
use metastore_domain::persist::InMemoryAspectStore;
use metastore_domain::registry::StaticEntityRegistry;
use metastore_domain::service::{EntityService, UpsertRequest};
use metastore_domain::well_known::{
    DatasetFieldProfile, DatasetKey, DatasetProfile, FabricType, GlossaryTermAssociation,
    GlossaryTerms, Histogram, PayloadAuditStamp, SchemaField, SchemaMetadata, SubTypes,
    ViewProperties,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = MetastoreConfig::default();
    config.fanout.mode = FanoutMode::Background;

    let index = InMemoryIndex::new();
    let producer = InMemoryEventProducer::new(64);
    let mut events = producer.subscribe();

    let engine = FanoutEngine::builder()
        .index(Arc::new(index.clone()))
        .producer(Arc::new(producer.clone()))
        .config(config.fanout.clone())
        .build();
    let (dispatcher, handle) = engine.launch();

    let service = EntityService::builder()
        .registry(Arc::new(StaticEntityRegistry::well_known()))
        .store(Arc::new(InMemoryAspectStore::new()))
        .fanout(dispatcher)
        .config(config)
        .build();

    let key = DatasetKey {
        platform: "urn:li:dataPlatform:platform".into(),
        name: "name".into(),
        origin: FabricType::Prod,
    };
    let urn = key.to_urn()?;
    let run = SystemMetadata::builder().run_id("example-run".to_string()).build();

    let view = ViewProperties {
        materialized: true,
        view_logic: "SELECT * FROM t".into(),
        view_language: "SQL".into(),
    };
    let sub_types = SubTypes {
        type_names: vec!["view".into()],
    };
    let profile = DatasetProfile {
        timestamp_millis: 0,
        row_count: Some(100),
        field_profiles: vec![DatasetFieldProfile {
            field_path: "a".into(),
            unique_count: Some(10),
            histogram: Some(Histogram {
                boundaries: vec!["0".into(), "10".into()],
                heights: vec![10.0],
            }),
        }],
    };
    let schema = SchemaMetadata {
        schema_name: "name".into(),
        platform: key.platform.clone(),
        version: 0,
        hash: String::new(),
        dataset: Some(urn.to_string()),
        fields: vec![SchemaField {
            field_path: "a".into(),
            native_data_type: "int".into(),
            description: None,
            global_tags: None,
            glossary_terms: None,
        }],
    };
    let terms = GlossaryTerms {
        terms: vec![GlossaryTermAssociation {
            urn: "urn:li:glossaryTerm:Classification.Confidential".into(),
        }],
        audit_stamp: Some(PayloadAuditStamp {
            time: 0,
            actor: "urn:li:corpuser:datahub".into(),
        }),
    };

    let requests = vec![
        UpsertRequest::for_urn(&urn, &view)?.with_system_metadata(run.clone()),
        UpsertRequest::for_key(&key, &sub_types)?.with_system_metadata(run.clone()),
        UpsertRequest::for_urn(&urn, &profile)?,
        UpsertRequest::for_urn(&urn, &schema)?,
        UpsertRequest::for_urn(&urn, &terms)?,
        // 未注册的切面：仅该条失败
        UpsertRequest::builder()
            .entity_type(DatasetKey::ENTITY_TYPE)
            .aspect_name("chartInfo")
            .aspect(serde_json::json!({}))
            .entity_urn(urn.as_str())
            .build(),
    ];

    let outcomes = service.upsert_batch(requests, &Actor::user("datahub")).await?;
    for outcome in &outcomes {
        match outcome {
            Ok(result) => println!(
                "{}#{} -> v{} (changed: {})",
                result.urn, result.aspect_name, result.version, result.changed
            ),
            Err(failure) => println!("failed: {failure}"),
        }
    }

    // 同内容重写：版本推进，changed=false
    let again = service
        .upsert(UpsertRequest::for_urn(&urn, &sub_types)?, &Actor::user("datahub"))
        .await?;
    println!(
        "{}: previous={:?} new={} version={}",
        SubTypes::NAME,
        again.previous,
        again.new,
        again.version
    );

    if let Some(handle) = handle {
        handle.shutdown();
        handle.join().await;
    }

    let stats = service.fanout_stats().snapshot();
    println!("fanout stats: {stats:?}");
    if let Some(doc) = index.document(&urn).await {
        println!("indexed aspects: {:?}", doc.aspects.keys().collect::<Vec<_>>());
    }
    for edge in index.edges_from(&urn).await {
        println!("edge: {} -[{}]-> {}", edge.source, edge.aspect_name, edge.destination);
    }

    let total = stats.events_published as usize;
    let received: Vec<_> = events.by_ref().take(total).collect().await;
    println!("received {} change events", received.len());

    Ok(())
}
