// src/models/url_entry.rs - Form entries and their per-entry outcomes
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer};
use validator::ValidationError;

/// One row of the shortening form, as submitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlEntry {
    pub url: String,

    /// Lifetime in minutes, kept as typed so that malformed input can be reported
    #[serde(default, deserialize_with = "deserialize_validity")]
    pub validity: Option<String>,

    #[serde(default)]
    pub shortcode: Option<String>,
}

impl UrlEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_validity(mut self, validity: impl Into<String>) -> Self {
        self.validity = Some(validity.into());
        self
    }

    pub fn with_shortcode(mut self, shortcode: impl Into<String>) -> Self {
        self.shortcode = Some(shortcode.into());
        self
    }

    /// The validity input, with an empty field treated as absent
    pub fn validity_input(&self) -> Option<&str> {
        self.validity.as_deref().filter(|v| !v.is_empty())
    }

    /// The custom shortcode input, with an empty field treated as absent
    pub fn shortcode_input(&self) -> Option<&str> {
        self.shortcode.as_deref().filter(|c| !c.is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ValidityInput {
    Text(String),
    Number(serde_json::Number),
}

// The form sends validity as text, the API contract sends it as a number.
fn deserialize_validity<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<ValidityInput>::deserialize(deserializer)?;
    Ok(input.map(|v| match v {
        ValidityInput::Text(text) => text,
        ValidityInput::Number(number) => number.to_string(),
    }))
}

/// Form fields an error can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryField {
    Url,
    Validity,
    Shortcode,
}

impl EntryField {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryField::Url => "url",
            EntryField::Validity => "validity",
            EntryField::Shortcode => "shortcode",
        }
    }
}

impl fmt::Display for EntryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryErrorKind {
    InvalidUrl,
    InvalidValidity,
    InvalidShortcodeFormat,
    DuplicateShortcode,
}

impl EntryErrorKind {
    /// Code stored in the underlying `ValidationError`
    pub fn code(&self) -> &'static str {
        match self {
            EntryErrorKind::InvalidUrl => "invalid_url",
            EntryErrorKind::InvalidValidity => "invalid_validity",
            EntryErrorKind::InvalidShortcodeFormat => "invalid_shortcode_format",
            EntryErrorKind::DuplicateShortcode => "duplicate_shortcode",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "invalid_url" => Some(EntryErrorKind::InvalidUrl),
            "invalid_validity" => Some(EntryErrorKind::InvalidValidity),
            "invalid_shortcode_format" => Some(EntryErrorKind::InvalidShortcodeFormat),
            "duplicate_shortcode" => Some(EntryErrorKind::DuplicateShortcode),
            _ => None,
        }
    }

    /// Builds the `ValidationError` for this kind with a user-facing message
    pub fn error(&self, message: impl Into<String>) -> ValidationError {
        let message: String = message.into();
        let mut err = ValidationError::new(self.code());
        err.message = Some(message.into());
        err
    }
}

/// Field-level errors of one entry; empty means the entry is valid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryErrors {
    fields: BTreeMap<EntryField, ValidationError>,
}

impl EntryErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for a field, keeping the first one already recorded
    pub fn add(&mut self, field: EntryField, error: ValidationError) {
        self.fields.entry(field).or_insert(error);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: EntryField) -> Option<&ValidationError> {
        self.fields.get(&field)
    }

    pub fn contains(&self, field: EntryField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn kind(&self, field: EntryField) -> Option<EntryErrorKind> {
        self.get(field)
            .and_then(|err| EntryErrorKind::from_code(&err.code))
    }

    pub fn message(&self, field: EntryField) -> Option<&str> {
        self.get(field)
            .and_then(|err| err.message.as_deref())
    }

    pub fn fields(&self) -> impl Iterator<Item = EntryField> + '_ {
        self.fields.keys().copied()
    }
}

impl fmt::Display for EntryErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self
            .fields
            .iter()
            .map(|(field, err)| {
                let reason = err.message.as_deref().unwrap_or("invalid");
                format!("{}: {}", field, reason)
            })
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&message)
    }
}

impl Serialize for EntryErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, err) in &self.fields {
            let reason = err.message.as_deref().unwrap_or("invalid");
            map.serialize_entry(field.as_str(), reason)?;
        }
        map.end()
    }
}

/// A successfully shortened entry, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortenedEntry {
    pub original_url: String,
    pub shortcode: String,
    pub short_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Terminal state of one submitted entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EntryOutcome {
    Registered(ShortenedEntry),
    Rejected { errors: EntryErrors },
    /// Valid input that could not be registered
    Failed { error: String },
}

impl EntryOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, EntryOutcome::Registered(_))
    }

    pub fn registered(&self) -> Option<&ShortenedEntry> {
        match self {
            EntryOutcome::Registered(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn errors(&self) -> Option<&EntryErrors> {
        match self {
            EntryOutcome::Rejected { errors } => Some(errors),
            _ => None,
        }
    }
}
