//! Entity identifiers.
//!
//! Participants, segments and activities carry ids assigned by the telemetry
//! provider. Weeks and seasons can be given explicit ids or derive one
//! deterministically from their name and start instant.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fmt;

/// A string entity ID, either external or derived from a content hash.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new EntityId from an existing id string.
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generate an EntityId from input fields.
    /// Uses SHA256 and takes the first 16 characters for brevity.
    pub fn generate(fields: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                hasher.update(b"|");
            }
            hasher.update(field.as_bytes());
        }
        let hash = hex::encode(hasher.finalize());
        Self(hash[..16].to_string())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Order numeric ids by value ("99" before "100"), ahead of any
    /// non-numeric id. Non-numeric ids compare as strings.
    pub fn natural_cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<u64>(), other.0.parse::<u64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Athlete id as issued by the telemetry provider
pub type ParticipantId = EntityId;

pub type SegmentId = EntityId;

pub type SeasonId = EntityId;

pub type WeekId = EntityId;

/// Recorded activity (performance record) id
pub type ActivityId = EntityId;

pub type EffortId = EntityId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation_deterministic() {
        let id1 = EntityId::generate(&["Week 3", "2025-03-11T00:00:00Z"]);
        let id2 = EntityId::generate(&["Week 3", "2025-03-11T00:00:00Z"]);
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_entity_id_different_inputs() {
        let id1 = EntityId::generate(&["Week 3", "2025-03-11T00:00:00Z"]);
        let id2 = EntityId::generate(&["Week 4", "2025-03-18T00:00:00Z"]);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_entity_id_hex_format() {
        let id = EntityId::generate(&["test"]);
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_entity_id_serializes_as_plain_string() {
        let id = EntityId::from("12345");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"12345\"");

        let deserialized: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_entity_id_ordering_is_lexicographic() {
        let mut ids = vec![EntityId::from("b"), EntityId::from("a"), EntityId::from("c")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "a");
        assert_eq!(ids[2].as_str(), "c");
    }

    #[test]
    fn test_natural_order_sorts_numeric_ids_by_value() {
        let mut ids = vec![
            EntityId::from("rider"),
            EntityId::from("100"),
            EntityId::from("99"),
            EntityId::from("1000"),
        ];
        ids.sort_by(|a, b| a.natural_cmp(b));
        let ordered: Vec<_> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ordered, vec!["99", "100", "1000", "rider"]);
    }

    #[test]
    fn test_entity_id_empty() {
        assert!(EntityId::from("  ").is_empty());
        assert!(!EntityId::from("x").is_empty());
    }
}
