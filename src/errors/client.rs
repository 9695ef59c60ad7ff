use thiserror::Error;

/// Failure of one call against the remote shortening API.
///
/// The `Display` output is what gets attached to the entry, so it keeps the
/// `API error:` / `Network error:` prefixes a form shows next to the field.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The endpoint answered with a non-2xx status
    #[error("API error: {0}")]
    Api(String),

    /// Transport failure or a body that could not be decoded
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum LogSinkError {
    #[error("Failed to send log: {0}")]
    Rejected(String),

    #[error("Logging error: {0}")]
    Transport(#[from] reqwest::Error),
}
