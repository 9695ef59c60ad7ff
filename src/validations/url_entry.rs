use std::collections::HashSet;

use url::Url;
use validator::ValidationError;

use crate::models::{EntryErrorKind, EntryErrors, EntryField, UrlEntry};
use crate::routes::RESERVED_SEGMENTS;

/// Canonical bounds for custom shortcodes
pub const DEFAULT_CUSTOM_CODE_MIN_LENGTH: usize = 3;
pub const DEFAULT_CUSTOM_CODE_MAX_LENGTH: usize = 12;

/// Anything that can answer whether a shortcode is already taken
pub trait KnownShortcodes {
    fn is_known(&self, code: &str) -> bool;
}

impl KnownShortcodes for HashSet<String> {
    fn is_known(&self, code: &str) -> bool {
        self.contains(code)
    }
}

/// Tunable parts of entry validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub custom_code_min_length: usize,
    pub custom_code_max_length: usize,
    /// Codes that would be shadowed by a fixed route
    pub reserved_shortcodes: &'static [&'static str],
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            custom_code_min_length: DEFAULT_CUSTOM_CODE_MIN_LENGTH,
            custom_code_max_length: DEFAULT_CUSTOM_CODE_MAX_LENGTH,
            reserved_shortcodes: RESERVED_SEGMENTS,
        }
    }
}

/// An entry that passed every field rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEntry {
    pub url: String,
    /// `None` when the caller left validity empty
    pub validity_minutes: Option<u32>,
    pub shortcode: Option<String>,
}

/// Validates that a URL string is absolute, with a scheme and a host
///
/// The parser silently drops control characters and surrounding whitespace,
/// so those are refused up front to keep the stored URL usable as a
/// `Location` header.
pub fn validate_url(url_str: &str) -> Result<(), ValidationError> {
    let invalid = || EntryErrorKind::InvalidUrl.error("Invalid URL format");

    if url_str.trim() != url_str || url_str.chars().any(char::is_control) {
        return Err(invalid());
    }

    match Url::parse(url_str) {
        Ok(url) if !url.scheme().is_empty() && url.host().is_some() => Ok(()),
        _ => Err(invalid()),
    }
}

/// Validates a validity input and returns it in minutes
///
/// Only plain ASCII digits are accepted, and the value must be positive.
pub fn validate_validity(input: &str) -> Result<u32, ValidationError> {
    let invalid = || {
        EntryErrorKind::InvalidValidity.error("Validity must be a positive integer (minutes)")
    };

    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    match input.parse::<u32>() {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => Err(invalid()),
    }
}

/// Validates that a custom shortcode is alphanumeric and within the length bounds
pub fn validate_shortcode_format(code: &str, rules: &ValidationRules) -> Result<(), ValidationError> {
    let length = code.chars().count();
    let well_formed = length >= rules.custom_code_min_length
        && length <= rules.custom_code_max_length
        && code.chars().all(|c| c.is_ascii_alphanumeric());

    if !well_formed {
        return Err(EntryErrorKind::InvalidShortcodeFormat.error(format!(
            "Shortcode must be {}-{} alphanumeric characters",
            rules.custom_code_min_length, rules.custom_code_max_length
        )));
    }

    if rules.reserved_shortcodes.contains(&code) {
        return Err(EntryErrorKind::InvalidShortcodeFormat
            .error(format!("Shortcode '{}' is reserved", code)));
    }

    Ok(())
}

/// Runs every field rule against an entry
///
/// Fields are checked independently so that one bad field never hides
/// another. A custom shortcode is only checked against `known` once its
/// format is valid.
pub fn check_entry<K>(
    entry: &UrlEntry,
    known: &K,
    rules: &ValidationRules,
) -> Result<ValidatedEntry, EntryErrors>
where
    K: KnownShortcodes + ?Sized,
{
    let mut errors = EntryErrors::new();

    if let Err(err) = validate_url(&entry.url) {
        errors.add(EntryField::Url, err);
    }

    let validity_minutes = match entry.validity_input().map(validate_validity).transpose() {
        Ok(minutes) => minutes,
        Err(err) => {
            errors.add(EntryField::Validity, err);
            None
        }
    };

    let shortcode = entry.shortcode_input();
    if let Some(code) = shortcode {
        match validate_shortcode_format(code, rules) {
            Err(err) => errors.add(EntryField::Shortcode, err),
            Ok(()) if known.is_known(code) => errors.add(
                EntryField::Shortcode,
                EntryErrorKind::DuplicateShortcode.error("Shortcode already in use"),
            ),
            Ok(()) => {}
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidatedEntry {
        url: entry.url.clone(),
        validity_minutes,
        shortcode: shortcode.map(str::to_owned),
    })
}

/// Returns the field errors of an entry, empty when it is valid
pub fn validate_entry<K>(entry: &UrlEntry, known: &K, rules: &ValidationRules) -> EntryErrors
where
    K: KnownShortcodes + ?Sized,
{
    check_entry(entry, known, rules).err().unwrap_or_default()
}
