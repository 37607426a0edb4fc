//! 元数据存储过程宏（metastore-macros）
//!
//! 为类型化的切面（aspect）载荷生成样板代码：
//! - `#[aspect(name = "...")]`：合并派生并实现 `::metastore_domain::aspect::Aspect`；
//! - `#[entity_key(entity_type = "...")]`：在 `Aspect` 之外实现
//!   `::metastore_domain::aspect::EntityKey`，按字段声明顺序给出 urn 键字段。
//!
use proc_macro::TokenStream;

mod aspect;
mod derive_utils;
mod entity_key;
mod utils;

/// 切面宏
/// - 合并/追加派生：Debug, Clone, PartialEq, Serialize, Deserialize
/// - 结构体默认追加 `#[serde(rename_all = "camelCase")]`（已显式声明时不覆盖）
/// - 参数：`#[aspect(name = "subTypes", camel_case = true|false)]`，`name` 必填
#[proc_macro_attribute]
pub fn aspect(attr: TokenStream, item: TokenStream) -> TokenStream {
    aspect::expand(attr, item)
}

/// 实体键宏（键切面）
/// - 仅支持具名字段结构体，字段顺序即 urn 中元组的顺序
/// - 同时实现 `Aspect` 与 `EntityKey`
/// - 参数：`#[entity_key(entity_type = "dataset", name = "datasetKey", camel_case = true|false)]`；
///   `name` 缺省为 `<entity_type>Key`
#[proc_macro_attribute]
pub fn entity_key(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity_key::expand(attr, item)
}
