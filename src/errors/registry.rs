use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The requested shortcode is already a key in the registry
    #[error("Shortcode already in use: {0}")]
    DuplicateShortcode(String),

    /// Random generation kept colliding with registered codes
    #[error("Failed to generate a unique shortcode after {attempts} attempts")]
    ShortcodeSpaceExhausted { attempts: usize },

    /// No record is registered under the shortcode
    #[error("Shortcode not found: {0}")]
    NotFound(String),

    /// The record exists but its validity window has passed
    #[error("Shortcode has expired: {0}")]
    Expired(String),
}
