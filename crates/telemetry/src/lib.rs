//! Thread-safe latency telemetry — collects per-stage timing measurements
//! for diagnostic usage.
//!
//! A [`StageTimer`] guard records elapsed wall-clock time into its probe on
//! drop, so a stage is measured by holding the guard across the work:
//!
//! ```
//! use steward_telemetry::LatencyProbe;
//!
//! let probe = LatencyProbe::new();
//! {
//!     let _timer = probe.time("retrieval");
//!     // ... stage work ...
//! }
//! assert_eq!(probe.flush().len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

/// Individual timing measurement for a named stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageMeasurement {
    pub stage: String,
    pub duration_ms: f64,
}

/// Collects stage-level latency metrics.
#[derive(Debug, Default)]
pub struct LatencyProbe {
    measurements: Mutex<Vec<StageMeasurement>>,
}

impl LatencyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing a stage; the measurement is recorded when the returned
    /// guard drops.
    pub fn time(&self, stage: impl Into<String>) -> StageTimer<'_> {
        StageTimer { probe: self, stage: stage.into(), start: Instant::now() }
    }

    /// Record an externally measured duration.
    pub fn record(&self, stage: impl Into<String>, duration_ms: f64) {
        let measurement = StageMeasurement { stage: stage.into(), duration_ms };
        self.measurements.lock().expect("telemetry lock poisoned").push(measurement);
    }

    /// Return and clear collected measurements.
    pub fn flush(&self) -> Vec<StageMeasurement> {
        let mut guard = self.measurements.lock().expect("telemetry lock poisoned");
        std::mem::take(&mut *guard)
    }

    /// Aggregate current measurements by stage (average duration).
    pub fn summary(&self) -> HashMap<String, f64> {
        let guard = self.measurements.lock().expect("telemetry lock poisoned");
        let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
        for measurement in guard.iter() {
            let entry = sums.entry(measurement.stage.clone()).or_insert((0.0, 0));
            entry.0 += measurement.duration_ms;
            entry.1 += 1;
        }
        sums.into_iter().map(|(stage, (total, count))| (stage, total / count as f64)).collect()
    }
}

/// RAII guard that records elapsed time for a stage on drop.
pub struct StageTimer<'a> {
    probe: &'a LatencyProbe,
    stage: String,
    start: Instant,
}

impl Drop for StageTimer<'_> {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        self.probe.record(std::mem::take(&mut self.stage), duration_ms);
    }
}
