use metastore_domain::aspect::{Aspect, EntityKey};
use metastore_macros::entity_key;

#[entity_key(entity_type = "chart")]
struct ChartKey {
    dashboard_tool: String,
    chart_id: String,
}

#[entity_key(entity_type = "mlModel", name = "mlModelKey")]
struct MlModelKey {
    platform: String,
    #[serde(rename = "modelName")]
    name: String,
}

fn main() {
    let key = ChartKey {
        dashboard_tool: "looker".into(),
        chart_id: "7".into(),
    };
    let _ = format!("{:?}", key.clone());
    let _urn = key.to_urn();
    let _: &'static [&'static str] = ChartKey::FIELDS;
    let _: &'static str = ChartKey::ENTITY_TYPE;
    let _: &'static str = MlModelKey::NAME;
}
