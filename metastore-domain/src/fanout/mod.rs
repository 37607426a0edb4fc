//! 提交后扇出（fanout）
//!
//! 写入提交之后，为每条已提交记录派生一次索引更新与一条变更事件：
//! - `FanoutDispatcher`：服务侧入口，按模式就地执行或入队；
//! - `FanoutEngine`：持有索引与事件生产者，构造就地分发器或启动后台任务；
//! - `FanoutHandle`：后台任务的关闭与等待句柄，关闭时排空已入队任务；
//! - `FanoutStats`：成功/失败/丢弃计数。
//!
//! 扇出失败只记录与计数，从不影响写入结果。
//!
mod engine;
mod stats;

pub use crate::config::{FanoutConfig, FanoutMode};
pub use engine::{FanoutDispatcher, FanoutEngine, FanoutHandle};
pub use stats::{FanoutStats, FanoutStatsSnapshot};

use crate::aspect::AspectRecord;
use crate::eventing::AspectChangeEvent;
use crate::index::IndexUpdate;

/// 一条已提交记录对应的全部副作用
#[derive(Debug, Clone, PartialEq)]
pub struct FanoutJob {
    pub index_update: IndexUpdate,
    pub event: AspectChangeEvent,
}

impl FanoutJob {
    pub fn from_commit(
        entity_type: &str,
        record: &AspectRecord,
        previous: Option<&AspectRecord>,
    ) -> Self {
        let index_update = IndexUpdate::builder()
            .urn(record.urn().clone())
            .entity_type(entity_type)
            .aspect_name(record.aspect_name())
            .maybe_previous(previous.map(|p| p.payload().clone()))
            .new(record.payload().clone())
            .version(record.version())
            .audit(record.audit().clone())
            .build();
        Self {
            index_update,
            event: AspectChangeEvent::from_commit(entity_type, record, previous),
        }
    }
}
