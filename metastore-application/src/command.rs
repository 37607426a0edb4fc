/// 应用层命令（Command）
///
/// 表达一次写入意图，由入口层构造并经 [`CommandBus`](crate::command_bus::CommandBus) 路由。
/// - `Output` 为逐条结果等面向调用方的返回载体；
/// - 建议保持语义化的“动宾结构”命名，如 `IngestAspects`。
///
/// 关联常量：
/// - `NAME`：命令的稳定名称，用于日志、追踪与路由。避免依赖 `type_name::<T>()`。
pub trait Command: Send + Sync + 'static {
    /// 命令的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;

    /// 命令处理完成后的返回值
    type Output: Send + 'static;
}
