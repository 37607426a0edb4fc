//! 元数据存储应用层（metastore-application）
//!
//! 位于传输入口与领域核心之间的薄层：命令与命令总线、应用上下文（执行主体）、
//! 授权契约，以及面向调用方的响应 DTO。
//!
pub mod authorizer;
pub mod command;
pub mod command_bus;
pub mod command_handler;
pub mod context;
pub mod dto;
pub mod error;
pub mod ingest;
pub mod inmemory_command_bus;

pub use inmemory_command_bus::InMemoryCommandBus;
pub use ingest::{IngestAspects, IngestAspectsHandler};
