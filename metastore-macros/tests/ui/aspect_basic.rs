use metastore_domain::aspect::Aspect;
use metastore_macros::aspect;

#[aspect(name = "chartInfo")]
struct ChartInfo {
    title: String,
    last_modified: i64,
}

// 已显式声明 rename_all 时不追加 camelCase
#[aspect(name = "rawProps")]
#[derive(Debug)]
#[serde(rename_all = "snake_case")]
struct RawProps {
    custom_properties: Vec<String>,
}

#[aspect(name = "deprecation", camel_case = false)]
struct Deprecation {
    deprecated_flag: bool,
}

#[aspect(name = "lifecycle")]
enum Lifecycle {
    Active,
    Retired,
}

fn main() {
    let info = ChartInfo {
        title: "t".into(),
        last_modified: 0,
    };
    let _ = format!("{:?}", info.clone());
    let _eq = info == info.clone();
    let _payload = info.to_payload();
    let _ = ChartInfo::NAME;

    let _ = RawProps {
        custom_properties: vec![],
    }
    .to_payload();
    let _ = Deprecation {
        deprecated_flag: true,
    }
    .to_payload();
    let _ = Lifecycle::from_payload(&serde_json::json!("Active"));
    let _ = Lifecycle::Retired;
}
