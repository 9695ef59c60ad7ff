// src/clients/log_sink.rs - Best-effort shipping of log events to a collector
use std::{fmt, str::FromStr, time::Duration};

use log::{error, warn};
use reqwest::Client;
use serde::Serialize;

use crate::errors::LogSinkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// Which side of the application an event comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStack {
    Backend,
    Frontend,
}

impl FromStr for LogStack {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "backend" => Ok(LogStack::Backend),
            "frontend" => Ok(LogStack::Frontend),
            _ => Err(format!(
                "Invalid log stack: {}. Must be one of: backend, frontend",
                s
            )),
        }
    }
}

impl fmt::Display for LogStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogStack::Backend => f.write_str("backend"),
            LogStack::Frontend => f.write_str("frontend"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub level: LogLevel,
    /// Component that emitted the event, e.g. `service` or `handler`
    pub package: String,
    pub message: String,
}

impl LogEvent {
    pub fn new(level: LogLevel, package: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            package: package.into(),
            message: message.into(),
        }
    }

    pub fn info(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, package, message)
    }

    pub fn warn(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, package, message)
    }

    pub fn error(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, package, message)
    }
}

/// Fire-and-forget destination for log events.
///
/// Implementations must never block the caller on delivery nor report
/// delivery failures back to it.
#[cfg_attr(test, mockall::automock)]
pub trait LogSink: Send + Sync {
    fn send(&self, event: LogEvent);
}

/// Sink used when shipping is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogSink;

impl LogSink for NoopLogSink {
    fn send(&self, _event: LogEvent) {}
}

#[derive(Serialize)]
struct LogPayload<'a> {
    stack: LogStack,
    level: LogLevel,
    package: &'a str,
    message: &'a str,
}

/// Posts `{stack, level, package, message}` to a collector endpoint
#[derive(Debug, Clone)]
pub struct RemoteLogSink {
    client: Client,
    endpoint: String,
    stack: LogStack,
}

impl RemoteLogSink {
    pub fn new(endpoint: impl Into<String>, stack: LogStack, timeout: Duration) -> Result<Self, LogSinkError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            stack,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one event and waits for the collector's answer
    pub async fn deliver(&self, event: &LogEvent) -> Result<(), LogSinkError> {
        let payload = LogPayload {
            stack: self.stack,
            level: event.level,
            package: &event.package,
            message: &event.message,
        };

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(LogSinkError::Rejected(response.status().to_string()));
        }

        Ok(())
    }
}

impl LogSink for RemoteLogSink {
    fn send(&self, event: LogEvent) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime available, dropping log event: {}", event.message);
            return;
        };

        let sink = self.clone();
        handle.spawn(async move {
            if let Err(e) = sink.deliver(&event).await {
                error!("{}", e);
            }
        });
    }
}
