use super::{EntityRegistry, EntitySpec};
use crate::aspect::{Aspect, EntityKey};
use crate::error::{DomainError, DomainResult};
use crate::well_known::{
    CorpUserKey, DataPlatformKey, DatasetKey, DatasetProfile, GlobalTags, GlossaryTermKey,
    GlossaryTerms, Ownership, SchemaMetadata, Status, SubTypes, TagKey, ViewProperties,
};
use std::collections::HashMap;

/// 启动时构建、运行期只读的实体注册表
#[derive(Debug, Clone, Default)]
pub struct StaticEntityRegistry {
    entities: HashMap<String, EntitySpec>,
}

impl StaticEntityRegistry {
    pub fn builder() -> StaticEntityRegistryBuilder {
        StaticEntityRegistryBuilder::default()
    }

    /// 内置的常见实体类型
    pub fn well_known() -> Self {
        Self::builder()
            .register::<DatasetKey, _>([
                ViewProperties::NAME,
                SubTypes::NAME,
                DatasetProfile::NAME,
                SchemaMetadata::NAME,
                GlossaryTerms::NAME,
                GlobalTags::NAME,
                Ownership::NAME,
                Status::NAME,
            ])
            .register::<DataPlatformKey, _>(Vec::<&str>::new())
            .register::<CorpUserKey, _>([GlobalTags::NAME, Status::NAME])
            .register::<TagKey, _>([Ownership::NAME, Status::NAME])
            .register::<GlossaryTermKey, _>([Ownership::NAME, Status::NAME])
            .build()
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }
}

impl EntityRegistry for StaticEntityRegistry {
    fn entity_spec(&self, entity_type: &str) -> DomainResult<&EntitySpec> {
        self.entities
            .get(entity_type)
            .ok_or_else(|| DomainError::UnknownEntityType {
                entity_type: entity_type.to_string(),
            })
    }
}

#[derive(Debug, Default)]
pub struct StaticEntityRegistryBuilder {
    entities: HashMap<String, EntitySpec>,
}

impl StaticEntityRegistryBuilder {
    /// 注册实体契约；同名实体后注册者覆盖先注册者
    pub fn entity(mut self, spec: EntitySpec) -> Self {
        self.entities.insert(spec.name().to_string(), spec);
        self
    }

    /// 以类型化键切面注册实体类型
    pub fn register<K, S>(self, aspects: impl IntoIterator<Item = S>) -> Self
    where
        K: EntityKey,
        S: Into<String>,
    {
        self.entity(EntitySpec::of::<K, S>(aspects))
    }

    pub fn build(self) -> StaticEntityRegistry {
        StaticEntityRegistry {
            entities: self.entities,
        }
    }
}
