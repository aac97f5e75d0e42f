//! Integration tests for logging system
//!
//! `init_logging` installs a process-wide subscriber, so everything that
//! depends on it lives in a single test.

use bridge_traits::error::Result as SinkResult;
use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CapturingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl LoggerSink for CapturingSink {
    fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

#[test]
fn test_global_logging_mirrors_into_sink() {
    let sink = Arc::new(CapturingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config).expect("first initialization succeeds");

    tracing::info!(target: "core_playback::engine", track_id = "abc", "Track selected");
    tracing::debug!(target: "core_playback::engine", "Below sink level");
    tracing::warn!(
        target: "provider_youtube",
        url = "https://www.googleapis.com/youtube/v3/search?q=x&key=AIza",
        "Search failed"
    );
    // Not a workspace target, so the default filter drops it.
    tracing::info!(target: "hyper::client", "connection pooled");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "Track selected");
        assert_eq!(entries[1].level, LogLevel::Warn);
        assert!(entries[1]
            .fields
            .get("url")
            .is_some_and(|url| url.ends_with("key=[REDACTED]")));
    }

    let second = init_logging(LoggingConfig::default());
    assert!(second.is_err());
}
