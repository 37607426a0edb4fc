//! 内存版索引（InMemoryIndex）
//!
//! - 搜索文档：每个 urn 一份，按切面名保存最新载荷与版本，应用即整体替换槽位；
//! - 关系图：载荷中任何可解析为 urn 的字符串（自身除外）产生一条边，
//!   边集合归属于 `(urn, aspect)`，每次应用整体替换；
//! - 低于已索引版本的更新被忽略。
//!
use super::{IndexUpdate, IndexUpdateService};
use crate::aspect::AspectKey;
use crate::error::DomainResult as Result;
use crate::urn::{URN_PREFIX, Urn};
use crate::value_object::Version;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedAspect {
    pub version: Version,
    pub payload: Value,
}

/// 单个实体的搜索文档
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchDocument {
    pub urn: Urn,
    pub entity_type: String,
    pub aspects: BTreeMap<String, IndexedAspect>,
}

/// 关系边：`source --aspect--> destination`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GraphEdge {
    pub source: Urn,
    pub aspect_name: String,
    pub destination: Urn,
}

#[derive(Default)]
struct IndexState {
    documents: HashMap<Urn, SearchDocument>,
    edges: HashMap<AspectKey, BTreeSet<GraphEdge>>,
}

#[derive(Clone, Default)]
pub struct InMemoryIndex {
    state: Arc<RwLock<IndexState>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn document(&self, urn: &Urn) -> Option<SearchDocument> {
        self.state.read().await.documents.get(urn).cloned()
    }

    pub async fn edges_from(&self, urn: &Urn) -> Vec<GraphEdge> {
        let state = self.state.read().await;
        let mut edges: Vec<GraphEdge> = state
            .edges
            .iter()
            .filter(|(key, _)| &key.urn == urn)
            .flat_map(|(_, set)| set.iter().cloned())
            .collect();
        edges.sort();
        edges
    }

    pub async fn edges_to(&self, urn: &Urn) -> Vec<GraphEdge> {
        let state = self.state.read().await;
        let mut edges: Vec<GraphEdge> = state
            .edges
            .values()
            .flat_map(|set| set.iter())
            .filter(|edge| &edge.destination == urn)
            .cloned()
            .collect();
        edges.sort();
        edges
    }

    pub async fn document_count(&self) -> usize {
        self.state.read().await.documents.len()
    }
}

/// 收集载荷中所有可解析为 urn 的字符串
fn collect_urns(value: &Value, out: &mut BTreeSet<Urn>) {
    match value {
        Value::String(s) if s.starts_with(URN_PREFIX) => {
            if let Ok(urn) = Urn::parse(s.as_str()) {
                out.insert(urn);
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_urns(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_urns(v, out)),
        _ => {}
    }
}

#[async_trait]
impl IndexUpdateService for InMemoryIndex {
    async fn apply(&self, update: &IndexUpdate) -> Result<()> {
        let mut state = self.state.write().await;

        let document = state
            .documents
            .entry(update.urn.clone())
            .or_insert_with(|| SearchDocument {
                urn: update.urn.clone(),
                entity_type: update.entity_type.clone(),
                aspects: BTreeMap::new(),
            });

        if let Some(existing) = document.aspects.get(&update.aspect_name) {
            if existing.version > update.version {
                debug!(
                    urn = %update.urn,
                    aspect = %update.aspect_name,
                    indexed = %existing.version,
                    stale = %update.version,
                    "ignoring stale index update"
                );
                return Ok(());
            }
        }

        document.aspects.insert(
            update.aspect_name.clone(),
            IndexedAspect {
                version: update.version,
                payload: update.new.clone(),
            },
        );

        let mut targets = BTreeSet::new();
        collect_urns(&update.new, &mut targets);
        let edges: BTreeSet<GraphEdge> = targets
            .into_iter()
            .filter(|target| target != &update.urn)
            .map(|destination| GraphEdge {
                source: update.urn.clone(),
                aspect_name: update.aspect_name.clone(),
                destination,
            })
            .collect();

        let key = AspectKey::new(update.urn.clone(), update.aspect_name.clone());
        if edges.is_empty() {
            state.edges.remove(&key);
        } else {
            state.edges.insert(key, edges);
        }
        Ok(())
    }
}
