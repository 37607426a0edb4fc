//! 授权契约
//!
//! 入口层只需要“允许/拒绝”这一判定结果，认证与策略存储不在本 crate 范围内。
//! 领域层在授权通过之后才会被调用，自身不再重复检查。
//!
use crate::context::AppContext;
use async_trait::async_trait;
use metastore_domain::aspect::Actor;
use std::collections::BTreeSet;
use std::sync::Arc;

/// 被写入的资源：实体类型与切面名
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceRef {
    pub entity_type: String,
    pub aspect_name: String,
}

/// 一次授权判定的输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub actor: Actor,
    /// 操作名，通常取命令的 `NAME`
    pub operation: &'static str,
    /// 去重后的资源集合
    pub resources: BTreeSet<ResourceRef>,
}

impl AuthorizationRequest {
    pub fn new(
        actor: Actor,
        operation: &'static str,
        resources: impl IntoIterator<Item = ResourceRef>,
    ) -> Self {
        Self {
            actor,
            operation,
            resources: resources.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Allow,
    Deny { reason: String },
}

impl AuthorizationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthorizationDecision::Allow)
    }
}

#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, ctx: &AppContext, request: &AuthorizationRequest)
    -> AuthorizationDecision;
}

#[async_trait]
impl<T> Authorizer for Arc<T>
where
    T: Authorizer + ?Sized,
{
    async fn authorize(
        &self,
        ctx: &AppContext,
        request: &AuthorizationRequest,
    ) -> AuthorizationDecision {
        (**self).authorize(ctx, request).await
    }
}

/// 放行一切请求
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn authorize(
        &self,
        _ctx: &AppContext,
        _request: &AuthorizationRequest,
    ) -> AuthorizationDecision {
        AuthorizationDecision::Allow
    }
}

/// 拒绝一切请求
#[derive(Debug, Clone, Default)]
pub struct DenyAll {
    reason: Option<String>,
}

impl DenyAll {
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

#[async_trait]
impl Authorizer for DenyAll {
    async fn authorize(
        &self,
        _ctx: &AppContext,
        request: &AuthorizationRequest,
    ) -> AuthorizationDecision {
        let reason = self
            .reason
            .clone()
            .unwrap_or_else(|| format!("{} denied for {}", request.operation, request.actor));
        AuthorizationDecision::Deny { reason }
    }
}
