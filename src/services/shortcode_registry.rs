// src/services/shortcode_registry.rs - In-memory shortcode ownership
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

use crate::errors::RegistryError;
use crate::models::{Click, ShortcodeRecord};
use crate::routes::RESERVED_SEGMENTS;
use crate::utils::id_generator;
use crate::validations::KnownShortcodes;

type Result<T> = std::result::Result<T, RegistryError>;

pub const DEFAULT_CODE_LENGTH: usize = 6;
pub const DEFAULT_MAX_GENERATION_ATTEMPTS: usize = 10;

/// Source of candidate shortcodes
#[cfg_attr(test, mockall::automock)]
pub trait ShortcodeGenerator: Send {
    fn generate(&mut self, length: usize) -> String;
}

/// Uniform base62 codes from the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomShortcodeGenerator;

impl ShortcodeGenerator for RandomShortcodeGenerator {
    fn generate(&mut self, length: usize) -> String {
        id_generator::generate_short_id(length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Length of generated codes
    pub code_length: usize,
    /// Draws tried before giving up on a generated code
    pub max_generation_attempts: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            max_generation_attempts: DEFAULT_MAX_GENERATION_ATTEMPTS,
        }
    }
}

/// Mapping from shortcode to record.
///
/// Keys are never overwritten: `register` either inserts a fresh key or
/// fails. Records live as long as the registry; expiry is checked on
/// resolution, nothing is evicted.
pub struct ShortcodeRegistry {
    records: HashMap<String, ShortcodeRecord>,
    generator: Box<dyn ShortcodeGenerator>,
    settings: RegistrySettings,
}

impl ShortcodeRegistry {
    pub fn new(settings: RegistrySettings) -> Self {
        Self::with_generator(settings, Box::new(RandomShortcodeGenerator))
    }

    pub fn with_generator(settings: RegistrySettings, generator: Box<dyn ShortcodeGenerator>) -> Self {
        Self {
            records: HashMap::new(),
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Registers `original_url` under a custom or generated shortcode
    ///
    /// ### Arguments
    /// * `original_url` - The URL the shortcode resolves to
    /// * `validity_minutes` - Lifetime of the record, counted from `now`
    /// * `shortcode` - Custom shortcode; a code is generated when `None`
    /// * `now` - Creation instant
    ///
    /// ### Errors
    /// * `RegistryError::DuplicateShortcode` - If the custom shortcode is already registered
    /// * `RegistryError::ShortcodeSpaceExhausted` - If no free code was drawn within the attempt bound
    pub fn register(
        &mut self,
        original_url: &str,
        validity_minutes: u32,
        shortcode: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ShortcodeRecord> {
        let shortcode = match shortcode {
            Some(code) => {
                if self.records.contains_key(code) {
                    return Err(RegistryError::DuplicateShortcode(code.to_string()));
                }
                code.to_string()
            }
            None => self.generate_unique()?,
        };

        let record = ShortcodeRecord {
            shortcode: shortcode.clone(),
            original_url: original_url.to_string(),
            created_at: now,
            expires_at: now + Duration::minutes(i64::from(validity_minutes)),
            clicks: Vec::new(),
        };

        debug!("Registered shortcode '{}' for {}", shortcode, original_url);
        self.records.insert(shortcode, record.clone());

        Ok(record)
    }

    fn generate_unique(&mut self) -> Result<String> {
        let attempts = self.settings.max_generation_attempts;

        for attempt in 1..=attempts {
            let code = self.generator.generate(self.settings.code_length);
            if !self.records.contains_key(&code) && !RESERVED_SEGMENTS.contains(&code.as_str()) {
                return Ok(code);
            }
            debug!("Generated shortcode '{}' collided (attempt {})", code, attempt);
        }

        warn!(
            "Shortcode generation gave up after {} attempts with {} codes registered",
            attempts,
            self.records.len()
        );
        Err(RegistryError::ShortcodeSpaceExhausted { attempts })
    }

    /// Returns the original URL of a live record and records the click
    ///
    /// ### Errors
    /// * `RegistryError::NotFound` - If the shortcode is unknown
    /// * `RegistryError::Expired` - If `now` is at or past the record's expiry
    pub fn resolve(&mut self, shortcode: &str, now: DateTime<Utc>) -> Result<String> {
        let record = self
            .records
            .get_mut(shortcode)
            .ok_or_else(|| RegistryError::NotFound(shortcode.to_string()))?;

        if record.is_expired_at(now) {
            return Err(RegistryError::Expired(shortcode.to_string()));
        }

        record.clicks.push(Click { at: now });
        Ok(record.original_url.clone())
    }

    pub fn get(&self, shortcode: &str) -> Option<&ShortcodeRecord> {
        self.records.get(shortcode)
    }

    pub fn contains(&self, shortcode: &str) -> bool {
        self.records.contains_key(shortcode)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.keys().map(String::as_str)
    }
}

impl Default for ShortcodeRegistry {
    fn default() -> Self {
        Self::new(RegistrySettings::default())
    }
}

impl KnownShortcodes for ShortcodeRegistry {
    fn is_known(&self, code: &str) -> bool {
        self.contains(code)
    }
}
