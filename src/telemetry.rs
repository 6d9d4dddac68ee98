//! Operational telemetry events and sinks.
//!
//! Events are local signals (the active schema version, per-repository
//! ingestion totals) written as JSON lines for debugging; nothing is
//! transmitted anywhere.

use std::io;

use serde::{Deserialize, Serialize};

/// A structured telemetry event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Records the current database schema version after migrations apply.
    SchemaVersionRecorded {
        /// Diesel migration version string (e.g. `20261001000000`).
        schema_version: String,
    },
    /// Summarises one repository's ingestion.
    RepositoryIngested {
        /// `owner/name`.
        repository: String,
        /// Pull requests committed to the store.
        stored: usize,
        /// Pull requests whose transaction rolled back.
        failed: usize,
    },
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Records telemetry events to stderr as JSON lines (JSONL).
#[derive(Debug, Default)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}

/// In-memory sink for asserting on emitted events.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use std::sync::Mutex;

    use super::{TelemetryEvent, TelemetrySink};

    /// Collects every recorded event.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<TelemetryEvent>>,
    }

    impl RecordingSink {
        /// Drains and returns the events recorded so far.
        #[must_use]
        pub fn take(&self) -> Vec<TelemetryEvent> {
            self.events
                .lock()
                .map(|mut events| events.drain(..).collect())
                .unwrap_or_default()
        }
    }

    impl TelemetrySink for RecordingSink {
        fn record(&self, event: TelemetryEvent) {
            if let Ok(mut events) = self.events.lock() {
                events.push(event);
            }
        }
    }
}
