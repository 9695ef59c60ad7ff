mod url_entry;

pub use url_entry::{
    check_entry, validate_entry, validate_shortcode_format, validate_url, validate_validity,
    KnownShortcodes, ValidatedEntry, ValidationRules,
};
