//! 实体标识（Urn）
//!
//! 形如 `urn:li:<entityType>:<key>` 的不可变字符串标识；复合键以括号元组编码，
//! 例如 `urn:li:dataset:(urn:li:dataPlatform:platform,name,PROD)`。
//! 两个 urn 相等当且仅当其字符串形式相等。
//!
//! 键元素中的 `%` `,` `(` `)` 以 `%25` `%2C` `%28` `%29` 转义；
//! 本身是完整 urn 的键元素（如 `urn:li:dataPlatform:hive`）原样嵌入。
//!
use crate::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

pub const URN_PREFIX: &str = "urn:li:";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Urn(String);

impl Urn {
    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        let invalid = |reason: &str| DomainError::InvalidUrn {
            urn: raw.clone(),
            reason: reason.to_string(),
        };

        let Some(rest) = raw.strip_prefix(URN_PREFIX) else {
            return Err(invalid("missing 'urn:li:' prefix"));
        };
        let Some((entity_type, key)) = rest.split_once(':') else {
            return Err(invalid("missing entity key"));
        };
        if entity_type.is_empty() {
            return Err(invalid("empty entity type"));
        }
        if key.is_empty() {
            return Err(invalid("empty entity key"));
        }
        if !balanced(key) {
            return Err(invalid("unbalanced parentheses in key"));
        }

        Ok(Self(raw))
    }

    /// 由实体类型与键元素构造：元素先转义，单元素直接拼接，多元素编码为括号元组
    pub fn from_parts<S: AsRef<str>>(entity_type: &str, parts: &[S]) -> DomainResult<Self> {
        let key = match parts {
            [] => {
                return Err(DomainError::InvalidUrn {
                    urn: format!("{URN_PREFIX}{entity_type}:"),
                    reason: "no key parts".to_string(),
                });
            }
            [single] => encode_key_part(single.as_ref()).into_owned(),
            many => {
                let encoded: Vec<Cow<'_, str>> =
                    many.iter().map(|p| encode_key_part(p.as_ref())).collect();
                format!("({})", encoded.join(","))
            }
        };
        Self::parse(format!("{URN_PREFIX}{entity_type}:{key}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// urn 隐含的实体类型（第三段）
    pub fn entity_type(&self) -> &str {
        let rest = &self.0[URN_PREFIX.len()..];
        rest.split_once(':').map(|(t, _)| t).unwrap_or(rest)
    }

    /// 实体类型之后的完整键
    pub fn key(&self) -> &str {
        let rest = &self.0[URN_PREFIX.len()..];
        rest.split_once(':').map(|(_, k)| k).unwrap_or("")
    }

    /// 键元素：元组按顶层逗号拆分（嵌套括号内的逗号不拆分）
    pub fn key_parts(&self) -> Vec<&str> {
        let key = self.key();
        match key.strip_prefix('(').and_then(|k| k.strip_suffix(')')) {
            Some(inner) => split_top_level(inner),
            None => vec![key],
        }
    }

    /// 反转义后的键元素，与 [`Urn::from_parts`] 互逆
    pub fn key_values(&self) -> Vec<String> {
        self.key_parts()
            .into_iter()
            .map(|part| decode_key_part(part).into_owned())
            .collect()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// 可原样嵌入的键元素：合法 urn，不含 `%`，且没有括号外的逗号
fn is_embedded_urn(part: &str) -> bool {
    part.starts_with(URN_PREFIX)
        && !part.contains('%')
        && split_top_level(part).len() == 1
        && Urn::parse(part).is_ok()
}

fn encode_key_part(part: &str) -> Cow<'_, str> {
    if is_embedded_urn(part) || !part.contains(['%', ',', '(', ')']) {
        return Cow::Borrowed(part);
    }
    let mut out = String::with_capacity(part.len() + 8);
    for ch in part.chars() {
        match ch {
            '%' => out.push_str("%25"),
            ',' => out.push_str("%2C"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// 只还原四个转义序列，其余 `%` 原样保留
fn decode_key_part(part: &str) -> Cow<'_, str> {
    if is_embedded_urn(part) || !part.contains('%') {
        return Cow::Borrowed(part);
    }
    let mut out = String::with_capacity(part.len());
    let mut rest = part;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let escaped = rest.get(pos + 1..pos + 3).and_then(|hex| {
            match hex.to_ascii_uppercase().as_str() {
                "25" => Some('%'),
                "2C" => Some(','),
                "28" => Some('('),
                "29" => Some(')'),
                _ => None,
            }
        });
        match escaped {
            Some(ch) => {
                out.push(ch);
                rest = &rest[pos + 3..];
            }
            None => {
                out.push('%');
                rest = &rest[pos + 1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn balanced(s: &str) -> bool {
    let mut depth: i32 = 0;
    for ch in s.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Urn {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Urn {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Urn> for String {
    fn from(urn: Urn) -> Self {
        urn.0
    }
}

impl AsRef<str> for Urn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = "urn:li:dataset:(urn:li:dataPlatform:platform,name,PROD)";

    #[test]
    fn parses_composite_dataset_urn() {
        let urn: Urn = DATASET.parse().unwrap();
        assert_eq!(urn.entity_type(), "dataset");
        assert_eq!(
            urn.key_parts(),
            vec!["urn:li:dataPlatform:platform", "name", "PROD"]
        );
        assert_eq!(urn.to_string(), DATASET);
    }

    #[test]
    fn parses_simple_urn() {
        let urn = Urn::parse("urn:li:corpuser:datahub").unwrap();
        assert_eq!(urn.entity_type(), "corpuser");
        assert_eq!(urn.key(), "datahub");
        assert_eq!(urn.key_parts(), vec!["datahub"]);
    }

    #[test]
    fn nested_tuple_commas_are_not_split() {
        let urn = Urn::parse("urn:li:schemaField:(urn:li:dataset:(urn:li:dataPlatform:p,n,PROD),col)")
            .unwrap();
        assert_eq!(
            urn.key_parts(),
            vec!["urn:li:dataset:(urn:li:dataPlatform:p,n,PROD)", "col"]
        );
    }

    #[test]
    fn rejects_malformed() {
        for raw in [
            "dataset:x",
            "urn:li:",
            "urn:li:dataset",
            "urn:li::x",
            "urn:li:dataset:",
            "urn:li:dataset:(a,b",
        ] {
            assert!(
                matches!(Urn::parse(raw), Err(DomainError::InvalidUrn { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn from_parts_round_trips_key_parts() {
        let parts = ["urn:li:dataPlatform:platform", "name", "PROD"];
        let urn = Urn::from_parts("dataset", &parts).unwrap();
        assert_eq!(urn.as_str(), DATASET);
        assert_eq!(urn.key_parts(), parts.to_vec());

        assert_eq!(urn.key_values(), parts.to_vec());

        let single = Urn::from_parts("tag", &["sometag"]).unwrap();
        assert_eq!(single.as_str(), "urn:li:tag:sometag");
    }

    #[test]
    fn reserved_characters_in_key_parts_are_escaped() {
        let parts = ["urn:li:dataPlatform:hive", "db.t,v2", "PROD"];
        let urn = Urn::from_parts("dataset", &parts).unwrap();
        assert_eq!(
            urn.as_str(),
            "urn:li:dataset:(urn:li:dataPlatform:hive,db.t%2Cv2,PROD)"
        );
        assert_eq!(urn.key_parts().len(), 3);
        assert_eq!(urn.key_values(), parts.to_vec());

        let parens =
            Urn::from_parts("dataset", &["urn:li:dataPlatform:hive", "f(x", "PROD"]).unwrap();
        assert_eq!(parens.key_values()[1], "f(x");

        let single = Urn::from_parts("tag", &["50%,(draft)"]).unwrap();
        assert_eq!(single.as_str(), "urn:li:tag:50%25%2C%28draft%29");
        assert_eq!(single.key_values(), vec!["50%,(draft)"]);
    }

    #[test]
    fn escaping_keeps_distinct_parts_distinct() {
        let a = Urn::from_parts("dataset", &["urn:li:dataPlatform:hive", "a,b"]).unwrap();
        let b = Urn::from_parts("dataset", &["urn:li:dataPlatform:hive,a", "b"]).unwrap();
        assert_ne!(a, b);
        assert_eq!(b.key_values(), vec!["urn:li:dataPlatform:hive,a", "b"]);

        let literal = Urn::from_parts("tag", &["a%2Cb"]).unwrap();
        let comma = Urn::from_parts("tag", &["a,b"]).unwrap();
        assert_ne!(literal, comma);
        assert_eq!(literal.key_values(), vec!["a%2Cb"]);
    }

    #[test]
    fn embedded_tuple_urn_is_kept_verbatim() {
        let parent = "urn:li:dataset:(urn:li:dataPlatform:p,n,PROD)";
        let field = Urn::from_parts("schemaField", &[parent, "col"]).unwrap();
        assert_eq!(field.as_str(), format!("urn:li:schemaField:({parent},col)"));
        assert_eq!(field.key_values(), vec![parent, "col"]);
    }

    #[test]
    fn serde_uses_string_form() {
        let urn = Urn::parse(DATASET).unwrap();
        let json = serde_json::to_value(&urn).unwrap();
        assert_eq!(json, serde_json::json!(DATASET));
        let back: Urn = serde_json::from_value(json).unwrap();
        assert_eq!(back, urn);
        assert!(serde_json::from_value::<Urn>(serde_json::json!("bogus")).is_err());
    }
}
