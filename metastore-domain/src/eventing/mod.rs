//! 事件子系统（eventing）
//!
//! 每次已提交的切面写入产生一条 `AspectChangeEvent`，经 `EventProducer` 发布：
//! - `EventProducer`：统一发布接口（至少一次，失败不回滚写入）；
//! - `InMemoryEventProducer`：基于广播通道的内存实现，可订阅事件流。
//!
//! 该模块仅定义协议，不绑定具体传输实现，可对接任意消息系统或内存实现。
//!
mod event;
mod producer;
mod producer_inmemory;

pub use event::{AspectChangeEvent, ChangeType};
pub use producer::EventProducer;
pub use producer_inmemory::InMemoryEventProducer;
