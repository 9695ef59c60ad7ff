// src/clients/shorten_api.rs - Submitting entries to a remote shortening endpoint
use std::{collections::HashSet, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info};
use reqwest::Client;
use serde::Serialize;

use crate::clients::{LogEvent, LogSink};
use crate::errors::ClientError;
use crate::models::{EntryErrors, ShortenRequest, ShortenResponse, UrlEntry};
use crate::validations::{check_entry, ValidationRules};

const PACKAGE: &str = "api";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortenApi: Send + Sync {
    /// Shortens one URL
    ///
    /// ### Errors
    /// * `ClientError::Api` - If the endpoint answers with a non-2xx status
    /// * `ClientError::Network` - If the request fails or the answer cannot be decoded
    async fn shorten(&self, request: &ShortenRequest) -> Result<ShortenResponse, ClientError>;
}

/// `ShortenApi` over HTTP, e.g. against `http://localhost:5000/api/shorten`
#[derive(Debug, Clone)]
pub struct HttpShortenApi {
    client: Client,
    endpoint: String,
}

impl HttpShortenApi {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ShortenApi for HttpShortenApi {
    async fn shorten(&self, request: &ShortenRequest) -> Result<ShortenResponse, ClientError> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;

        if !response.status().is_success() {
            let body = response.text().await?;
            return Err(ClientError::Api(body));
        }

        Ok(response.json::<ShortenResponse>().await?)
    }
}

/// Result of one entry sent through [`RemoteShortener`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RemoteOutcome {
    Shortened {
        original_url: String,
        short_url: String,
        expiry: DateTime<Utc>,
    },
    /// Failed local validation, nothing was sent
    Rejected { errors: EntryErrors },
    /// The call itself failed
    Failed { error: String },
}

/// Validates entries locally and shortens the valid ones through a [`ShortenApi`].
///
/// Uniqueness of custom shortcodes is left to the remote side, so only the
/// format rules run here. Calls are made one at a time in submission order.
pub struct RemoteShortener<A: ShortenApi> {
    api: A,
    rules: ValidationRules,
    default_validity_minutes: u32,
    log_sink: Arc<dyn LogSink>,
}

impl<A: ShortenApi> RemoteShortener<A> {
    pub fn new(
        api: A,
        rules: ValidationRules,
        default_validity_minutes: u32,
        log_sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            api,
            rules,
            default_validity_minutes,
            log_sink,
        }
    }

    pub async fn submit(&self, entries: &[UrlEntry]) -> Vec<RemoteOutcome> {
        let no_known_codes: HashSet<String> = HashSet::new();
        let mut outcomes = Vec::with_capacity(entries.len());

        for entry in entries {
            let validated = match check_entry(entry, &no_known_codes, &self.rules) {
                Ok(validated) => validated,
                Err(errors) => {
                    self.log_sink.send(LogEvent::error(
                        PACKAGE,
                        format!("Validation failed for URL {}: {}", entry.url, errors),
                    ));
                    outcomes.push(RemoteOutcome::Rejected { errors });
                    continue;
                }
            };

            let request = ShortenRequest {
                url: validated.url,
                validity: Some(
                    validated
                        .validity_minutes
                        .unwrap_or(self.default_validity_minutes),
                ),
                shortcode: validated.shortcode,
            };

            self.log_sink.send(LogEvent::info(
                PACKAGE,
                format!("Sending API request for URL: {}", request.url),
            ));

            match self.api.shorten(&request).await {
                Ok(response) => {
                    info!("Shortened URL created: {}", response.short_url);
                    self.log_sink.send(LogEvent::info(
                        PACKAGE,
                        format!("Shortened URL created: {}", response.short_url),
                    ));
                    outcomes.push(RemoteOutcome::Shortened {
                        original_url: request.url,
                        short_url: response.short_url,
                        expiry: response.expiry,
                    });
                }
                Err(e) => {
                    error!("Shortening {} failed: {}", request.url, e);
                    self.log_sink.send(LogEvent::error(
                        PACKAGE,
                        format!("Request for URL {} failed: {}", request.url, e),
                    ));
                    outcomes.push(RemoteOutcome::Failed {
                        error: e.to_string(),
                    });
                }
            }
        }

        outcomes
    }
}
