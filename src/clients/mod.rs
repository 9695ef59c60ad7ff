mod log_sink;
mod shorten_api;

pub use log_sink::{LogEvent, LogLevel, LogSink, LogStack, NoopLogSink, RemoteLogSink};
pub use shorten_api::{HttpShortenApi, RemoteOutcome, RemoteShortener, ShortenApi};

#[cfg(test)]
pub use log_sink::MockLogSink;
#[cfg(test)]
pub use shorten_api::MockShortenApi;
