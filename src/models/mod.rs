mod api;
mod shortcode_record;
mod url_entry;

pub use api::{BatchRequest, ShortenRequest, ShortenResponse};
pub use shortcode_record::{Click, ShortcodeRecord};
pub use url_entry::{EntryErrorKind, EntryErrors, EntryField, EntryOutcome, ShortenedEntry, UrlEntry};
