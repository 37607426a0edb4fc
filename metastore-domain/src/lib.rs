//! 元数据存储领域层（metastore-domain）
//!
//! 版本化的“实体-切面”元数据存储核心，提供：
//! - 实体标识（`urn`）、切面与审计模型（`aspect`）、版本号（`value_object`）
//! - 实体注册表（`registry`）：合法切面、键切面与 urn 推导
//! - 版本化切面存储与事务重试（`persist`）
//! - 二级索引同步（`index`）与变更事件（`eventing`）
//! - 提交后扇出（`fanout`）：就地或后台执行索引更新与事件发布
//! - 批量写入编排（`service`）与运行配置（`config`）
//!
//! 本 crate 与存储和传输实现解耦，仅定义协议与内存参考实现，
//! 以便在不同基础设施（关系数据库、搜索引擎、消息中间件等）上进行适配实现。
//!
//! 典型用法：
//! 1. 用 `StaticEntityRegistry` 注册实体类型，或直接使用 `well_known()`；
//! 2. 选择 `AspectStore`、`IndexUpdateService`、`EventProducer` 的实现；
//! 3. 通过 `FanoutEngine` 构造扇出分发器（后台模式需保留 `FanoutHandle`）；
//! 4. 以 `EntityService::upsert_batch` 写入切面，逐条获取结果。
//!
pub mod aspect;
pub mod config;
pub mod error;
pub mod eventing;
pub mod fanout;
pub mod index;
pub mod persist;
pub mod registry;
pub mod service;
pub mod urn;
pub mod value_object;
pub mod well_known;

// 允许在本 crate 内部通过 ::metastore_domain 进行自引用，
// 以便过程宏在本 crate 内也能解析到 ::metastore_domain 路径。
extern crate self as metastore_domain;
