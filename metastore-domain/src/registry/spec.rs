use crate::aspect::EntityKey;
use crate::error::{DomainError, DomainResult};
use crate::urn::Urn;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// 键切面的结构契约：切面名与有序的键字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAspectSpec {
    aspect_name: String,
    fields: Vec<String>,
}

impl KeyAspectSpec {
    pub fn new<S: Into<String>>(
        aspect_name: impl Into<String>,
        fields: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            aspect_name: aspect_name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// 由类型化键切面得到契约
    pub fn of<K: EntityKey>() -> Self {
        Self::new(K::NAME, K::FIELDS.iter().copied())
    }

    pub fn aspect_name(&self) -> &str {
        &self.aspect_name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// 由键切面载荷确定性地推导 urn：字段按契约顺序取值，单字段直接拼接，多字段编码为元组
    pub fn derive_urn(&self, entity_type: &str, payload: &Value) -> DomainResult<Urn> {
        let invalid = |reason: String| DomainError::InvalidKeyAspect {
            entity_type: entity_type.to_string(),
            reason,
        };

        let Some(obj) = payload.as_object() else {
            return Err(invalid(format!(
                "{} payload must be an object",
                self.aspect_name
            )));
        };

        let mut parts: Vec<String> = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let part = match obj.get(field) {
                Some(Value::String(s)) if !s.is_empty() => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                Some(Value::String(_)) => return Err(invalid(format!("field '{field}' is empty"))),
                Some(Value::Null) | None => {
                    return Err(invalid(format!("missing key field '{field}'")));
                }
                Some(_) => return Err(invalid(format!("key field '{field}' must be a scalar"))),
            };
            parts.push(part);
        }

        Urn::from_parts(entity_type, &parts)
    }

    /// 逆向推导：由 urn 的键元素（反转义后）还原键切面载荷
    pub fn key_from_urn(&self, urn: &Urn) -> DomainResult<Value> {
        let parts = urn.key_values();
        if parts.len() != self.fields.len() {
            return Err(DomainError::InvalidKeyAspect {
                entity_type: urn.entity_type().to_string(),
                reason: format!(
                    "urn has {} key parts, {} expects {}",
                    parts.len(),
                    self.aspect_name,
                    self.fields.len()
                ),
            });
        }

        let obj: Map<String, Value> = self
            .fields
            .iter()
            .zip(parts)
            .map(|(field, part)| (field.clone(), Value::String(part)))
            .collect();
        Ok(Value::Object(obj))
    }
}

/// 一个实体类型的结构契约
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpec {
    name: String,
    key: KeyAspectSpec,
    aspects: BTreeSet<String>,
}

impl EntitySpec {
    /// 键切面总是合法切面之一
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        key: KeyAspectSpec,
        aspects: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut aspects: BTreeSet<String> = aspects.into_iter().map(Into::into).collect();
        aspects.insert(key.aspect_name().to_string());
        Self {
            name: name.into(),
            key,
            aspects,
        }
    }

    pub fn of<K: EntityKey, S: Into<String>>(aspects: impl IntoIterator<Item = S>) -> Self {
        Self::new(K::ENTITY_TYPE, KeyAspectSpec::of::<K>(), aspects)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &KeyAspectSpec {
        &self.key
    }

    pub fn aspects(&self) -> impl Iterator<Item = &str> {
        self.aspects.iter().map(String::as_str)
    }

    pub fn has_aspect(&self, aspect: &str) -> bool {
        self.aspects.contains(aspect)
    }

    pub fn is_key_aspect(&self, aspect: &str) -> bool {
        self.key.aspect_name() == aspect
    }
}
