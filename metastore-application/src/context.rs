use metastore_domain::aspect::Actor;

/// 应用层上下文（Application Context）
///
/// 承载一次入口调用所需的横切信息：
/// - 执行主体（`actor`）：已由入口层认证，用于授权与审计戳；
/// - 关联追踪 ID（`correlation_id`）：贯穿日志，便于跨系统排查。
///
/// 典型用法：
/// ```rust
/// use metastore_application::context::AppContext;
/// use metastore_domain::aspect::Actor;
///
/// let ctx = AppContext::new(Actor::user("datahub")).with_correlation_id("cor-123");
/// assert_eq!(ctx.correlation_id.as_deref(), Some("cor-123"));
/// ```
#[derive(Clone, Debug)]
pub struct AppContext {
    pub actor: Actor,
    pub correlation_id: Option<String>,
}

impl AppContext {
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}
