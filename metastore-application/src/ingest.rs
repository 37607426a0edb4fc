//! 切面摄取命令
//!
//! 入口层的唯一写用例：一次授权覆盖整个批次，通过后交给 `EntityService::upsert_batch`，
//! 并把逐条结果映射为 [`UpsertAspectResponse`]。
//!
use crate::authorizer::{AuthorizationDecision, AuthorizationRequest, Authorizer, ResourceRef};
use crate::command::Command;
use crate::command_handler::CommandHandler;
use crate::context::AppContext;
use crate::dto::UpsertAspectResponse;
use crate::error::AppError;
use async_trait::async_trait;
use metastore_domain::service::{EntityService, UpsertRequest};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct IngestAspects {
    pub requests: Vec<UpsertRequest>,
}

impl IngestAspects {
    pub fn new(requests: Vec<UpsertRequest>) -> Self {
        Self { requests }
    }

    fn resources(&self) -> impl Iterator<Item = ResourceRef> + '_ {
        self.requests.iter().map(|r| ResourceRef {
            entity_type: r.entity_type.clone(),
            aspect_name: r.aspect_name.clone(),
        })
    }
}

impl Command for IngestAspects {
    const NAME: &'static str = "IngestAspects";
    type Output = Vec<UpsertAspectResponse>;
}

pub struct IngestAspectsHandler {
    service: Arc<EntityService>,
    authorizer: Arc<dyn Authorizer>,
}

impl IngestAspectsHandler {
    pub fn new(service: Arc<EntityService>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            service,
            authorizer,
        }
    }
}

#[async_trait]
impl CommandHandler<IngestAspects> for IngestAspectsHandler {
    #[tracing::instrument(
        skip_all,
        fields(
            command = IngestAspects::NAME,
            batch_size = cmd.requests.len(),
            correlation_id = ctx.correlation_id.as_deref().unwrap_or("-"),
        )
    )]
    async fn handle(
        &self,
        ctx: &AppContext,
        cmd: IngestAspects,
    ) -> Result<Vec<UpsertAspectResponse>, AppError> {
        let request =
            AuthorizationRequest::new(ctx.actor.clone(), IngestAspects::NAME, cmd.resources());

        if let AuthorizationDecision::Deny { reason } =
            self.authorizer.authorize(ctx, &request).await
        {
            warn!(actor = %ctx.actor, %reason, "ingest denied");
            return Err(AppError::Authorization(reason));
        }

        let outcomes = self.service.upsert_batch(cmd.requests, &ctx.actor).await?;
        let responses: Vec<UpsertAspectResponse> =
            outcomes.into_iter().map(UpsertAspectResponse::from).collect();

        info!(
            succeeded = responses.iter().filter(|r| r.is_success()).count(),
            total = responses.len(),
            "ingest handled"
        );
        Ok(responses)
    }
}
