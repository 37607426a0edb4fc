use metastore_domain::aspect::{Aspect, EntityKey};
use metastore_macros::{aspect, entity_key};
use serde_json::json;

#[entity_key(entity_type = "dataFlow")]
struct DataFlowKey {
    orchestrator: String,
    flow_id: String,
    cluster: String,
}

#[entity_key(entity_type = "mlModel", name = "mlModelKey", camel_case = false)]
struct MlModelKey {
    platform: String,
    #[serde(rename = "modelName")]
    model_name: String,
}

#[entity_key(entity_type = "chart", name = "chartKey")]
#[serde(rename_all = "snake_case")]
struct ChartKey {
    dashboard_tool: String,
    chart_id: String,
}

#[aspect(name = "dataFlowInfo")]
struct DataFlowInfo {
    display_name: String,
    external_url: Option<String>,
}

#[test]
fn entity_key_constants() {
    assert_eq!(DataFlowKey::NAME, "dataFlowKey");
    assert_eq!(DataFlowKey::ENTITY_TYPE, "dataFlow");
    assert_eq!(DataFlowKey::FIELDS, &["orchestrator", "flowId", "cluster"]);

    assert_eq!(MlModelKey::NAME, "mlModelKey");
    assert_eq!(MlModelKey::FIELDS, &["platform", "modelName"]);
}

#[test]
fn entity_key_derives_tuple_urn_in_field_order() {
    let key = DataFlowKey {
        orchestrator: "airflow".into(),
        flow_id: "daily".into(),
        cluster: "prod".into(),
    };
    assert_eq!(
        key.to_urn().unwrap().as_str(),
        "urn:li:dataFlow:(airflow,daily,prod)"
    );
    assert_eq!(
        key.to_payload().unwrap(),
        json!({ "orchestrator": "airflow", "flowId": "daily", "cluster": "prod" })
    );
}

#[test]
fn declared_rename_all_drives_key_fields() {
    assert_eq!(ChartKey::FIELDS, &["dashboard_tool", "chart_id"]);

    let key = ChartKey {
        dashboard_tool: "looker".into(),
        chart_id: "7".into(),
    };
    assert_eq!(
        key.to_payload().unwrap(),
        json!({ "dashboard_tool": "looker", "chart_id": "7" })
    );
    assert_eq!(key.to_urn().unwrap().as_str(), "urn:li:chart:(looker,7)");
}

#[test]
fn aspect_payload_round_trips_camel_case() {
    let info = DataFlowInfo {
        display_name: "Daily".into(),
        external_url: None,
    };
    let payload = info.to_payload().unwrap();
    assert_eq!(payload, json!({ "displayName": "Daily", "externalUrl": null }));
    assert_eq!(DataFlowInfo::from_payload(&payload).unwrap(), info);
    assert_eq!(DataFlowInfo::NAME, "dataFlowInfo");
}
