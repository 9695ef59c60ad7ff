use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UrlEntry;

/// Body of `POST /api/shorten`, also sent by the remote client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortenRequest {
    pub url: String,

    pub validity: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcode: Option<String>,
}

/// Answer of `POST /api/shorten`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortenResponse {
    #[serde(rename = "shortUrl")]
    pub short_url: String,

    pub expiry: DateTime<Utc>,
}

/// Body of `POST /api/shorten/batch`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub entries: Vec<UrlEntry>,
}

impl From<ShortenRequest> for UrlEntry {
    fn from(req: ShortenRequest) -> Self {
        UrlEntry {
            url: req.url,
            validity: req.validity.map(|minutes| minutes.to_string()),
            shortcode: req.shortcode,
        }
    }
}
