//! 面向调用方的响应 DTO，与领域模型解耦
//!
use metastore_domain::error::ErrorKind;
use metastore_domain::service::{ItemOutcome, UpdateResult};
use serde::Serialize;
use serde_json::Value;

/// 单条写入成功
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertAspectSuccess {
    pub urn: String,
    pub aspect_name: String,
    pub previous_value: Option<Value>,
    pub new_value: Value,
    pub version: u64,
    pub changed: bool,
}

/// 单条写入失败
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertAspectFailure {
    pub error_kind: ErrorKind,
    pub message: String,
}

/// 逐条写入结果，序列化时不带外层标签
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpsertAspectResponse {
    Success(UpsertAspectSuccess),
    Failure(UpsertAspectFailure),
}

impl UpsertAspectResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, UpsertAspectResponse::Success(_))
    }
}

impl From<UpdateResult> for UpsertAspectResponse {
    fn from(result: UpdateResult) -> Self {
        UpsertAspectResponse::Success(UpsertAspectSuccess {
            urn: result.urn.to_string(),
            aspect_name: result.aspect_name,
            previous_value: result.previous,
            new_value: result.new,
            version: result.version.value(),
            changed: result.changed,
        })
    }
}

impl From<ItemOutcome> for UpsertAspectResponse {
    fn from(outcome: ItemOutcome) -> Self {
        match outcome {
            Ok(result) => result.into(),
            Err(failure) => UpsertAspectResponse::Failure(UpsertAspectFailure {
                error_kind: failure.kind,
                message: failure.message,
            }),
        }
    }
}
