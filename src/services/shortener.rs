// src/services/shortener.rs - Batch submission business logic
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;

use super::shortcode_registry::ShortcodeRegistry;
use crate::clients::{LogEvent, LogSink};
use crate::config::ShortenerConfig;
use crate::errors::{AppError, RegistryError};
use crate::models::{
    EntryErrorKind, EntryErrors, EntryField, EntryOutcome, ShortcodeRecord, ShortenedEntry,
    UrlEntry,
};
use crate::validations::{check_entry, ValidationRules};

type Result<T> = std::result::Result<T, AppError>;

const PACKAGE: &str = "service";

/// Owns the registry and drives submitted entries through validation and registration.
///
/// The registry sits behind one mutex that is held for a whole batch, so the
/// check-then-insert of every entry is atomic and concurrent batches are
/// serialized.
pub struct ShortenerService {
    registry: Mutex<ShortcodeRegistry>,
    rules: ValidationRules,
    base_url: String,
    default_validity_minutes: u32,
    max_batch_size: usize,
    log_sink: Arc<dyn LogSink>,
}

impl ShortenerService {
    pub fn new(registry: ShortcodeRegistry, config: &ShortenerConfig, log_sink: Arc<dyn LogSink>) -> Self {
        Self {
            registry: Mutex::new(registry),
            rules: config.validation_rules(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_validity_minutes: config.default_validity_minutes,
            max_batch_size: config.max_batch_size,
            log_sink,
        }
    }

    pub fn from_config(config: &ShortenerConfig, log_sink: Arc<dyn LogSink>) -> Self {
        Self::new(ShortcodeRegistry::new(config.registry_settings()), config, log_sink)
    }

    /// Processes a batch in submission order, one outcome per entry
    ///
    /// ### Errors
    /// * `AppError::Validation` - If the batch is empty or larger than the configured maximum
    pub fn submit(&self, entries: &[UrlEntry], now: DateTime<Utc>) -> Result<Vec<EntryOutcome>> {
        if entries.is_empty() {
            return Err(AppError::Validation("At least one URL is required".to_string()));
        }
        if entries.len() > self.max_batch_size {
            return Err(AppError::Validation(format!(
                "At most {} URLs can be shortened at once",
                self.max_batch_size
            )));
        }

        self.log_sink
            .send(LogEvent::info(PACKAGE, "Submitting URL entries"));
        debug!("Processing batch of {} entries", entries.len());

        let mut registry = self.registry.lock();
        let outcomes: Vec<EntryOutcome> = entries
            .iter()
            .map(|entry| self.process(&mut registry, entry, now))
            .collect();

        let registered = outcomes.iter().filter(|o| o.is_registered()).count();
        info!(
            "Batch processed: {} registered, {} not registered",
            registered,
            outcomes.len() - registered
        );

        Ok(outcomes)
    }

    /// Shortens a single entry
    ///
    /// ### Errors
    /// * `AppError::Validation` - If a field is invalid
    /// * `AppError::Conflict` - If the custom shortcode is already in use
    /// * `AppError::Internal` - If no free shortcode could be generated
    pub fn shorten(&self, entry: &UrlEntry, now: DateTime<Utc>) -> Result<ShortenedEntry> {
        let mut registry = self.registry.lock();
        match self.process(&mut registry, entry, now) {
            EntryOutcome::Registered(shortened) => Ok(shortened),
            EntryOutcome::Rejected { errors } => Err(errors.into()),
            EntryOutcome::Failed { error } => Err(AppError::Internal(error)),
        }
    }

    // Pending -> Validated -> Registered, or Pending -> Rejected
    fn process(&self, registry: &mut ShortcodeRegistry, entry: &UrlEntry, now: DateTime<Utc>) -> EntryOutcome {
        let validated = match check_entry(entry, &*registry, &self.rules) {
            Ok(validated) => validated,
            Err(errors) => {
                debug!("Rejected '{}': {}", entry.url, errors);
                self.log_sink.send(LogEvent::error(
                    PACKAGE,
                    format!("Validation failed for {}: {}", entry.url, errors),
                ));
                return EntryOutcome::Rejected { errors };
            }
        };

        let validity_minutes = validated
            .validity_minutes
            .unwrap_or(self.default_validity_minutes);

        match registry.register(&validated.url, validity_minutes, validated.shortcode.as_deref(), now) {
            Ok(record) => {
                info!("Shortened: {} -> {}", record.original_url, record.shortcode);
                self.log_sink.send(LogEvent::info(
                    PACKAGE,
                    format!("Shortened: {} -> {}", record.original_url, record.shortcode),
                ));
                EntryOutcome::Registered(self.to_shortened(record))
            }
            // Unreachable after a passing check, kept so the key is never overwritten
            Err(RegistryError::DuplicateShortcode(_)) => {
                let mut errors = EntryErrors::new();
                errors.add(
                    EntryField::Shortcode,
                    EntryErrorKind::DuplicateShortcode.error("Shortcode already in use"),
                );
                EntryOutcome::Rejected { errors }
            }
            Err(e) => {
                warn!("Could not register {}: {}", validated.url, e);
                self.log_sink.send(LogEvent::error(
                    PACKAGE,
                    format!("Could not register {}: {}", validated.url, e),
                ));
                EntryOutcome::Failed { error: e.to_string() }
            }
        }
    }

    fn to_shortened(&self, record: ShortcodeRecord) -> ShortenedEntry {
        ShortenedEntry {
            short_url: self.short_url(&record.shortcode),
            original_url: record.original_url,
            shortcode: record.shortcode,
            expires_at: record.expires_at,
        }
    }

    pub fn short_url(&self, shortcode: &str) -> String {
        format!("{}/{}", self.base_url, shortcode)
    }

    /// Returns a copy of the record registered under `shortcode`
    pub fn lookup(&self, shortcode: &str) -> Result<ShortcodeRecord> {
        self.registry
            .lock()
            .get(shortcode)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(shortcode.to_string()).into())
    }

    /// Resolves a shortcode to its original URL, recording a click
    pub fn resolve(&self, shortcode: &str, now: DateTime<Utc>) -> Result<String> {
        Ok(self.registry.lock().resolve(shortcode, now)?)
    }

    pub fn registered_count(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockLogSink, NoopLogSink};
    use crate::services::shortcode_registry::{MockShortcodeGenerator, RegistrySettings};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    fn service() -> ShortenerService {
        ShortenerService::from_config(&ShortenerConfig::default(), Arc::new(NoopLogSink))
    }

    fn service_with_codes(codes: &[&str]) -> ShortenerService {
        let mut codes: Vec<String> = codes.iter().rev().map(|c| c.to_string()).collect();
        let mut generator = MockShortcodeGenerator::new();
        generator
            .expect_generate()
            .returning(move |_| codes.pop().unwrap_or_else(|| "zzzzzz".to_string()));
        let registry = ShortcodeRegistry::with_generator(RegistrySettings::default(), Box::new(generator));
        ShortenerService::new(registry, &ShortenerConfig::default(), Arc::new(NoopLogSink))
    }

    #[test]
    fn test_blank_entry_gets_generated_code_and_default_expiry() {
        let service = service();
        let entry = UrlEntry::new("https://example.com")
            .with_validity("")
            .with_shortcode("");

        let outcomes = service.submit(&[entry], now()).unwrap();
        let shortened = outcomes[0].registered().unwrap();

        assert_eq!(shortened.shortcode.len(), 6);
        assert!(shortened.shortcode.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(shortened.expires_at, now() + Duration::minutes(30));
        assert_eq!(
            shortened.short_url,
            format!("http://localhost:5000/{}", shortened.shortcode)
        );
        assert_eq!(shortened.original_url, "https://example.com");
    }

    #[test]
    fn test_batch_allows_partial_success() {
        let service = service();
        let entries = vec![
            UrlEntry::new("https://a.example").with_shortcode("alpha"),
            UrlEntry::new("not-a-url").with_validity("10").with_shortcode("abc"),
            UrlEntry::new("https://c.example").with_validity("5"),
        ];

        let outcomes = service.submit(&entries, now()).unwrap();

        assert!(outcomes[0].is_registered());
        let errors = outcomes[1].errors().unwrap();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec![EntryField::Url]);
        assert_eq!(
            outcomes[2].registered().unwrap().expires_at,
            now() + Duration::minutes(5)
        );
        assert_eq!(service.registered_count(), 2);
        assert!(service.lookup("abc").is_err());
    }

    #[test]
    fn test_custom_code_repeated_in_same_batch_is_rejected() {
        let service = service();
        let entries = vec![
            UrlEntry::new("https://a.example").with_shortcode("shared"),
            UrlEntry::new("https://b.example").with_shortcode("shared"),
        ];

        let outcomes = service.submit(&entries, now()).unwrap();

        assert!(outcomes[0].is_registered());
        assert_eq!(
            outcomes[1].errors().unwrap().kind(EntryField::Shortcode),
            Some(EntryErrorKind::DuplicateShortcode)
        );
        assert_eq!(service.lookup("shared").unwrap().original_url, "https://a.example");
    }

    #[test]
    fn test_generated_code_blocks_later_entry_in_batch() {
        let service = service_with_codes(&["gen123"]);
        let entries = vec![
            UrlEntry::new("https://a.example"),
            UrlEntry::new("https://b.example").with_shortcode("gen123"),
        ];

        let outcomes = service.submit(&entries, now()).unwrap();

        assert_eq!(outcomes[0].registered().unwrap().shortcode, "gen123");
        assert_eq!(
            outcomes[1].errors().unwrap().kind(EntryField::Shortcode),
            Some(EntryErrorKind::DuplicateShortcode)
        );
        assert_eq!(service.registered_count(), 1);
    }

    #[test]
    fn test_codes_from_earlier_batches_are_known() {
        let service = service();
        service
            .submit(&[UrlEntry::new("https://a.example").with_shortcode("keep")], now())
            .unwrap();

        let outcomes = service
            .submit(&[UrlEntry::new("https://b.example").with_shortcode("keep")], now())
            .unwrap();

        assert_eq!(
            outcomes[0].errors().unwrap().kind(EntryField::Shortcode),
            Some(EntryErrorKind::DuplicateShortcode)
        );
    }

    #[test]
    fn test_exhausted_generation_fails_only_that_entry() {
        let service = service_with_codes(&[]);
        let entries = vec![
            UrlEntry::new("https://a.example"),
            UrlEntry::new("https://b.example"),
            UrlEntry::new("https://c.example").with_shortcode("custom"),
        ];

        let outcomes = service.submit(&entries, now()).unwrap();

        assert_eq!(outcomes[0].registered().unwrap().shortcode, "zzzzzz");
        assert_eq!(
            outcomes[1],
            EntryOutcome::Failed {
                error: "Failed to generate a unique shortcode after 10 attempts".to_string()
            }
        );
        assert!(outcomes[2].is_registered());
    }

    #[test]
    fn test_batch_size_bounds() {
        let service = service();
        let too_many: Vec<UrlEntry> = (0..6)
            .map(|i| UrlEntry::new(format!("https://{}.example", i)))
            .collect();

        assert!(matches!(service.submit(&[], now()), Err(AppError::Validation(_))));
        assert!(matches!(
            service.submit(&too_many, now()),
            Err(AppError::Validation(_))
        ));
        assert!(service.submit(&too_many[..5], now()).is_ok());
        assert_eq!(service.registered_count(), 5);
    }

    #[test]
    fn test_shorten_maps_errors() {
        let service = service();
        service
            .shorten(&UrlEntry::new("https://a.example").with_shortcode("taken"), now())
            .unwrap();

        let duplicate = service
            .shorten(&UrlEntry::new("https://b.example").with_shortcode("taken"), now())
            .unwrap_err();
        assert!(matches!(duplicate, AppError::Conflict(_)));

        let invalid = service
            .shorten(&UrlEntry::new("https://b.example").with_validity("0"), now())
            .unwrap_err();
        assert!(matches!(invalid, AppError::Validation(_)));
    }

    #[test]
    fn test_resolve_and_lookup() {
        let service = service();
        service
            .shorten(&UrlEntry::new("https://a.example").with_shortcode("visit"), now())
            .unwrap();

        assert_eq!(service.resolve("visit", now()).unwrap(), "https://a.example");
        assert_eq!(service.lookup("visit").unwrap().clicks.len(), 1);
        assert!(matches!(
            service.resolve("visit", now() + Duration::minutes(31)),
            Err(AppError::Gone(_))
        ));
        assert!(matches!(service.lookup("nope"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_log_events_are_emitted_per_entry() {
        let mut sink = MockLogSink::new();
        sink.expect_send()
            .withf(|event| event.message == "Submitting URL entries")
            .times(1)
            .returning(|_| ());
        sink.expect_send()
            .withf(|event| event.message.starts_with("Shortened: https://a.example -> "))
            .times(1)
            .returning(|_| ());
        sink.expect_send()
            .withf(|event| event.message.starts_with("Validation failed for not-a-url"))
            .times(1)
            .returning(|_| ());

        let service = ShortenerService::from_config(&ShortenerConfig::default(), Arc::new(sink));
        service
            .submit(
                &[UrlEntry::new("https://a.example"), UrlEntry::new("not-a-url")],
                now(),
            )
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unavailable_log_sink_does_not_change_outcomes() {
        let entries = vec![
            UrlEntry::new("https://a.example").with_shortcode("same1"),
            UrlEntry::new("bad"),
        ];

        let quiet = service().submit(&entries, now()).unwrap();

        let failing = crate::clients::RemoteLogSink::new(
            "http://127.0.0.1:9/logs",
            crate::clients::LogStack::Backend,
            std::time::Duration::from_millis(100),
        )
        .unwrap();
        let noisy_service =
            ShortenerService::from_config(&ShortenerConfig::default(), Arc::new(failing));
        let noisy = noisy_service.submit(&entries, now()).unwrap();

        // Let the spawned deliveries run into the closed port
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;

        assert_eq!(quiet, noisy);
        assert_eq!(noisy_service.registered_count(), 1);
        assert!(noisy_service.lookup("same1").is_ok());
    }
}
