//! 内存版事件生产者（InMemoryEventProducer）
//!
//! 基于 `tokio::sync::broadcast` 广播变更事件，同时保留最近发布事件的副本便于检查：
//! - `publish`：记录并广播事件，无订阅者时不视为错误；
//! - 历史副本与广播缓冲区同容量，超出后丢弃最旧的事件；`take_published` 取出并清空；
//! - `subscribe`：返回 `'static` 生命周期事件流，便于在 `tokio::spawn` 中使用；
//! - 典型用途：测试环境、示例与本地开发。
//!
use super::{AspectChangeEvent, EventProducer};
use crate::error::{DomainError, DomainResult as Result};
use async_trait::async_trait;
use futures_core::stream::BoxStream;
use futures_util::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

#[derive(Clone)]
pub struct InMemoryEventProducer {
    tx: broadcast::Sender<AspectChangeEvent>,
    published: Arc<Mutex<VecDeque<AspectChangeEvent>>>,
    capacity: usize,
}

impl InMemoryEventProducer {
    /// `capacity` 为广播缓冲区与历史副本的容量
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel(capacity);
        Self {
            tx,
            published: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn history(&self) -> MutexGuard<'_, VecDeque<AspectChangeEvent>> {
        match self.published.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn subscribe(&self) -> BoxStream<'static, Result<AspectChangeEvent>> {
        let rx = self.tx.subscribe();
        let stream = BroadcastStream::new(rx).map(|r| {
            r.map_err(|e| DomainError::EventPublishFailed {
                urn: String::new(),
                aspect: String::new(),
                reason: e.to_string(),
            })
        });
        Box::pin(stream)
    }

    /// 最近发布事件的快照（按发布顺序）
    pub fn published(&self) -> Vec<AspectChangeEvent> {
        self.history().iter().cloned().collect()
    }

    /// 取出并清空历史副本
    pub fn take_published(&self) -> Vec<AspectChangeEvent> {
        self.history().drain(..).collect()
    }
}

impl Default for InMemoryEventProducer {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventProducer for InMemoryEventProducer {
    async fn publish(&self, event: &AspectChangeEvent) -> Result<()> {
        {
            let mut history = self.history();
            if history.len() == self.capacity {
                history.pop_front();
            }
            history.push_back(event.clone());
        }
        // 当前无订阅者时 send 返回错误，这里视为非致命并忽略
        let _ = self.tx.send(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::{Actor, AuditStamp};
    use crate::urn::Urn;
    use crate::value_object::Version;
    use serde_json::json;

    fn event(version: u64) -> AspectChangeEvent {
        AspectChangeEvent::builder()
            .urn(Urn::parse("urn:li:tag:pii").unwrap())
            .entity_type("tag")
            .aspect_name("status")
            .new(json!({ "removed": false }))
            .version(Version::from_value(version))
            .audit(AuditStamp::now(&Actor::user("datahub")))
            .build()
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let producer = InMemoryEventProducer::new(4);
        producer.publish(&event(0)).await.unwrap();
        assert_eq!(producer.published().len(), 1);
    }

    #[tokio::test]
    async fn history_is_bounded_and_drainable() {
        let producer = InMemoryEventProducer::new(2);
        for v in 0..5 {
            producer.publish(&event(v)).await.unwrap();
        }

        let kept: Vec<u64> = producer
            .published()
            .iter()
            .map(|e| e.version().value())
            .collect();
        assert_eq!(kept, vec![3, 4]);

        assert_eq!(producer.take_published().len(), 2);
        assert!(producer.published().is_empty());
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let producer = InMemoryEventProducer::new(8);
        let mut stream = producer.subscribe();

        producer
            .publish_batch(&[event(0), event(1)])
            .await
            .unwrap();

        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(first.version(), Version::from_value(0));
        assert_eq!(second.version(), Version::from_value(1));
    }
}
