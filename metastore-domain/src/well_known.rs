//! 常见实体的键切面与切面载荷
//!
//! 覆盖数据集摄取中最常见的一组：数据集/数据平台/用户/标签/术语的键切面，
//! 以及子类型、视图属性、画像、模式、标签、术语、属主、状态等切面。
//!
use metastore_macros::{aspect, entity_key};
use serde::{Deserialize, Serialize};

/// 数据所在环境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FabricType {
    Dev,
    Test,
    Qa,
    Uat,
    Ei,
    Pre,
    Stg,
    NonProd,
    Prod,
    Corp,
}

#[entity_key(entity_type = "dataset")]
pub struct DatasetKey {
    pub platform: String,
    pub name: String,
    pub origin: FabricType,
}

#[entity_key(entity_type = "dataPlatform")]
pub struct DataPlatformKey {
    pub platform_name: String,
}

#[entity_key(entity_type = "corpuser", name = "corpUserKey")]
pub struct CorpUserKey {
    pub username: String,
}

#[entity_key(entity_type = "tag")]
pub struct TagKey {
    pub name: String,
}

#[entity_key(entity_type = "glossaryTerm")]
pub struct GlossaryTermKey {
    pub name: String,
}

#[aspect(name = "subTypes")]
pub struct SubTypes {
    pub type_names: Vec<String>,
}

#[aspect(name = "viewProperties")]
pub struct ViewProperties {
    pub materialized: bool,
    pub view_logic: String,
    pub view_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub boundaries: Vec<String>,
    #[serde(default)]
    pub heights: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetFieldProfile {
    pub field_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Histogram>,
}

#[aspect(name = "datasetProfile")]
pub struct DatasetProfile {
    pub timestamp_millis: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<i64>,
    #[serde(default)]
    pub field_profiles: Vec<DatasetFieldProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagAssociation {
    pub tag: String,
}

#[aspect(name = "globalTags")]
pub struct GlobalTags {
    pub tags: Vec<TagAssociation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryTermAssociation {
    pub urn: String,
}

/// 载荷内嵌的审计戳（毫秒时间戳 + 主体 urn），与存储层的审计戳相互独立
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadAuditStamp {
    pub time: i64,
    pub actor: String,
}

#[aspect(name = "glossaryTerms")]
pub struct GlossaryTerms {
    pub terms: Vec<GlossaryTermAssociation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_stamp: Option<PayloadAuditStamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    pub field_path: String,
    pub native_data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_tags: Option<GlobalTags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glossary_terms: Option<GlossaryTerms>,
}

#[aspect(name = "schemaMetadata")]
pub struct SchemaMetadata {
    pub schema_name: String,
    pub platform: String,
    pub version: i64,
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    pub fields: Vec<SchemaField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnershipType {
    TechnicalOwner,
    BusinessOwner,
    DataSteward,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub owner: String,
    #[serde(rename = "type")]
    pub ownership_type: OwnershipType,
}

#[aspect(name = "ownership")]
pub struct Ownership {
    pub owners: Vec<Owner>,
}

#[aspect(name = "status")]
pub struct Status {
    pub removed: bool,
}
