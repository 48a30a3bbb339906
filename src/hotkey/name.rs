//! Stable identity for a named shortcut

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a shortcut: a raw value plus a shared prefix
///
/// The combined value (`prefix + raw_value`) keys both the in-memory registry
/// and the preference store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    raw_value: String,
    prefix: String,
}

impl Name {
    /// Create a name with an empty prefix
    pub fn new(raw_value: impl Into<String>) -> Self {
        Self::with_prefix(raw_value, "")
    }

    /// Create a name with an explicit prefix
    pub fn with_prefix(raw_value: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            raw_value: raw_value.into(),
            prefix: prefix.into(),
        }
    }

    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key used for persistence: prefix followed by the raw value
    pub fn combined_value(&self) -> String {
        format!("{}{}", self.prefix, self.raw_value)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.raw_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_value() {
        let name = Name::with_prefix("toggle", "app.");
        assert_eq!(name.combined_value(), "app.toggle");
        assert_eq!(name.to_string(), "app.toggle");
        assert_eq!(Name::new("toggle").combined_value(), "toggle");
    }

    #[test]
    fn test_equality_is_structural() {
        assert_eq!(Name::with_prefix("a", "p"), Name::with_prefix("a", "p"));
        // Same combined value, different parts
        assert_ne!(Name::with_prefix("ab", "p"), Name::with_prefix("b", "pa"));
    }

    #[test]
    fn test_serialization_field_names() {
        let json = serde_json::to_string(&Name::with_prefix("toggle", "app.")).unwrap();
        assert!(json.contains("\"rawValue\":\"toggle\""));
        assert!(json.contains("\"prefix\":\"app.\""));
    }
}
