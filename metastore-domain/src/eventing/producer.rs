//! 事件生产者（EventProducer）协议
//!
//! 定义变更事件的发布抽象（至少一次语义），支持批量发布与 'static 生命周期事件流。
//!
use super::AspectChangeEvent;
use crate::error::DomainResult as Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait EventProducer: Send + Sync {
    async fn publish(&self, event: &AspectChangeEvent) -> Result<()>;

    async fn publish_batch(&self, events: &[AspectChangeEvent]) -> Result<()> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<T> EventProducer for Arc<T>
where
    T: EventProducer + ?Sized,
{
    async fn publish(&self, event: &AspectChangeEvent) -> Result<()> {
        (**self).publish(event).await
    }

    async fn publish_batch(&self, events: &[AspectChangeEvent]) -> Result<()> {
        (**self).publish_batch(events).await
    }
}
