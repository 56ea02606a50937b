//! Identity types shared by every layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The stable name of a participant across reconnects.
///
/// Either the display name the player typed at the welcome prompt or a
/// generated guest token. Two admitted participants never share one.
///
/// Serializes as a plain string (`"alice"`, not `{"0":"alice"}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wraps a name. Surrounding whitespace is trimmed.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.len() == name.len() {
            Self(name)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if the name is empty after trimming.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Identifier of one match (one pairing of two identities).
///
/// Rematches between the same pair keep the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_new_trims_whitespace() {
        assert_eq!(Identity::new("  alice \t").as_str(), "alice");
    }

    #[test]
    fn test_identity_blank_is_empty() {
        assert!(Identity::new("   ").is_empty());
        assert!(!Identity::new("bob").is_empty());
    }

    #[test]
    fn test_identity_serializes_as_plain_string() {
        let json = serde_json::to_string(&Identity::new("alice")).unwrap();
        assert_eq!(json, "\"alice\"");
    }

    #[test]
    fn test_match_id_display() {
        assert_eq!(MatchId(3).to_string(), "M-3");
    }
}
