// src/models/shortcode_record.rs - Registry data structures
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single resolution of a shortcode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Click {
    pub at: DateTime<Utc>,
}

/// Represents a registered shortcode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcodeRecord {
    /// The unique key of this record
    pub shortcode: String,

    /// The original, long URL that was shortened
    pub original_url: String,

    /// When this shortcode was registered
    pub created_at: DateTime<Utc>,

    /// When this shortcode stops resolving
    pub expires_at: DateTime<Utc>,

    /// Resolutions in the order they happened
    pub clicks: Vec<Click>,
}

impl ShortcodeRecord {
    /// Checks if the record has expired at the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
