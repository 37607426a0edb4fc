//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象，用于封装不可变的概念性值与校验逻辑。
//!

use serde::{Deserialize, Serialize};
use std::fmt;

/// 切面版本号（每个 `(urn, aspect)` 独立计数，首次写入为 0）
///
/// 提供类型安全的版本号操作，避免直接使用整数导致的语义不明确问题。
/// 「尚无版本」以 `Option<Version>::None` 表示，而不是特殊值。
///
/// # 示例
///
/// ```
/// use metastore_domain::value_object::Version;
///
/// let v0 = Version::after(None);
/// assert_eq!(v0.value(), 0);
/// assert!(v0.is_first());
///
/// let v1 = Version::after(Some(v0));
/// assert_eq!(v1.value(), 1);
/// assert!(v1 > v0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// 首个版本（版本号为 0）
    pub const FIRST: Version = Version(0);

    /// 从值创建版本号
    ///
    /// ```
    /// use metastore_domain::value_object::Version;
    ///
    /// let v = Version::from_value(5);
    /// assert_eq!(v.value(), 5);
    /// ```
    pub const fn from_value(value: u64) -> Self {
        Self(value)
    }

    /// 给定当前最新版本，返回下一次写入应分配的版本号
    pub fn after(prior: Option<Version>) -> Self {
        prior.map(|v| v.next()).unwrap_or(Self::FIRST)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    pub fn is_first(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self::from_value(value)
    }
}

impl From<Version> for u64 {
    fn from(version: Version) -> Self {
        version.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_write_is_zero() {
        assert_eq!(Version::after(None), Version::FIRST);
        assert!(Version::after(None).is_first());
        assert_eq!(Version::default(), Version::FIRST);
    }

    #[test]
    fn after_increments_by_exactly_one() {
        for n in 0..5u64 {
            assert_eq!(Version::after(Some(Version::from_value(n))).value(), n + 1);
        }
    }

    #[test]
    fn ordering_and_display() {
        let v1 = Version::from_value(1);
        let v2 = v1.next();
        assert!(v2 > v1);
        assert_eq!(format!("{v2}"), "v2");
        let raw: u64 = v2.into();
        assert_eq!(raw, 2);
    }

    // 序列化为裸整数，便于持久化与 DTO 输出
    #[test]
    fn serde_is_transparent() {
        let v = Version::from_value(42);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "42");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
