//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier for a placed entity, kept across edits and revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derive a deterministic id from an external identifier.
    ///
    /// UUID strings are used as-is, anything else is hashed into a v5 UUID so
    /// the same feature id always maps to the same entity.
    pub fn from_external(raw: &str) -> Self {
        match Uuid::parse_str(raw) {
            Ok(uuid) => Self(uuid),
            Err(_) => Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, raw.as_bytes())),
        }
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordinal violation rank
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Severity {
    #[default]
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Severity {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.pad(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::None < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert_eq!(Severity::High.as_u8(), 3);
    }

    #[test]
    fn test_external_id_is_deterministic() {
        let a = EntityId::from_external("camp-42");
        let b = EntityId::from_external("camp-42");
        assert_eq!(a, b);
        assert_ne!(a, EntityId::from_external("camp-43"));
    }

    #[test]
    fn test_external_uuid_is_preserved() {
        let uuid = Uuid::new_v4();
        assert_eq!(EntityId::from_external(&uuid.to_string()).0, uuid);
    }
}
