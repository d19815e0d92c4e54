//! Run timings
//!
//! Coarse elapsed-time measurements for a deploy run (the whole run, the
//! artifact scan, the list read). Each measurement is logged when it
//! completes and kept for the run report.

use parking_lot::Mutex;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::info;

/// One labelled measurement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    /// Label, e.g. `scan artifacts`
    pub label: String,

    /// Elapsed wall-clock time
    pub duration: Duration,
}

/// Collects timings for one run
#[derive(Debug, Default)]
pub struct RunTimings {
    entries: Mutex<Vec<Timing>>,
}

impl RunTimings {
    /// Creates an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finished measurement
    pub fn record(&self, label: &str, duration: Duration) {
        info!(
            label,
            elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "{label}: {:.3}s",
            duration.as_secs_f64()
        );
        self.entries.lock().push(Timing {
            label: label.to_string(),
            duration,
        });
    }

    /// Awaits `fut` and records how long it took
    ///
    /// The measurement is recorded whether the future succeeds or not.
    pub async fn time<F, T>(&self, label: &str, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let start = Instant::now();
        let output = fut.await;
        self.record(label, start.elapsed());
        output
    }

    /// Gets the first measurement with `label`
    #[must_use]
    pub fn get(&self, label: &str) -> Option<Duration> {
        self.entries
            .lock()
            .iter()
            .find(|t| t.label == label)
            .map(|t| t.duration)
    }

    /// Gets all measurements in recording order
    #[must_use]
    pub fn all(&self) -> Vec<Timing> {
        self.entries.lock().clone()
    }
}
