//! Cache Entry Types

/// Record key shared by every tier (SQLite `INTEGER PRIMARY KEY`)
pub type Key = i64;

/// Immutable key/value record moved between tiers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheEntry {
    key: Key,
    value: String,
}

impl CacheEntry {
    /// Create a new entry
    pub fn new(key: Key, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    /// Synthetic benchmark record: `key -> "Value{key}"`
    pub fn synthetic(key: Key) -> Self {
        Self::new(key, format!("Value{}", key))
    }

    #[inline]
    pub fn key(&self) -> Key {
        self.key
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Split into owned parts
    pub fn into_parts(self) -> (Key, String) {
        (self.key, self.value)
    }
}

// =============================================================================
// Tests
// =============================================================================
