//! Benchmark records and sinks.
//!
//! An experiment runs [`timed_fit`] for each (variant, size, noise) cell and
//! hands the outcome to a [`ResultSink`] as a [`RunRecord`]. Writing records
//! to disk, enforcing timeouts and producing reports is the caller's job.

use std::time::{Duration, Instant};

use log::{debug, warn};
use ndarray::Array2;

use crate::error::Result;
use crate::metrics::ari;
use crate::model::SpectralClustering;

/// One benchmark observation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    /// Experiment name, e.g. `"Decomposition"`.
    pub experiment: String,
    /// Variant under test, e.g. `"sparse_symmetric"`.
    pub variant: String,
    /// Number of input points.
    pub n_points: usize,
    /// Noise level the data was generated with.
    pub noise: f64,
    /// Wall-clock fit time.
    pub elapsed: Duration,
    /// The run exceeded the caller's time budget.
    pub timed_out: bool,
    /// Predicted labels, absent when the fit failed or timed out.
    pub predicted: Option<Vec<usize>>,
    /// Ground-truth labels.
    pub truth: Vec<usize>,
}

impl RunRecord {
    /// Record for a fit outcome; `timeout` marks runs slower than the budget.
    pub fn from_fit(
        experiment: &str,
        variant: &str,
        noise: f64,
        elapsed: Duration,
        outcome: Result<Vec<usize>>,
        truth: Vec<usize>,
        timeout: Option<Duration>,
    ) -> Self {
        let timed_out = timeout.is_some_and(|limit| elapsed > limit);
        let predicted = match outcome {
            Ok(labels) if !timed_out => Some(labels),
            Ok(_) => None,
            Err(e) => {
                warn!("{experiment}/{variant}: fit failed: {e}");
                None
            }
        };
        Self {
            experiment: experiment.to_string(),
            variant: variant.to_string(),
            n_points: truth.len(),
            noise,
            elapsed,
            timed_out,
            predicted,
            truth,
        }
    }

    /// Adjusted Rand index against the ground truth, if labels were produced.
    pub fn ari(&self) -> Option<f64> {
        self.predicted.as_deref().map(|p| ari(p, &self.truth))
    }
}

/// Destination for benchmark records.
pub trait ResultSink {
    /// Accept one record.
    fn record(&mut self, record: RunRecord) -> Result<()>;
}

/// Keeps records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Vec<RunRecord>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in arrival order.
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Mean fit time of the records of `variant` that did not time out.
    pub fn mean_elapsed(&self, variant: &str) -> Option<Duration> {
        let times: Vec<Duration> = self
            .records
            .iter()
            .filter(|r| r.variant == variant && !r.timed_out)
            .map(|r| r.elapsed)
            .collect();
        let count = u32::try_from(times.len()).ok().filter(|&c| c > 0)?;
        Some(times.iter().sum::<Duration>() / count)
    }
}

impl ResultSink for MemorySink {
    fn record(&mut self, record: RunRecord) -> Result<()> {
        self.records.push(record);
        Ok(())
    }
}

/// Fit `model` on `points` and measure the wall-clock time.
pub fn timed_fit(model: &SpectralClustering, points: &Array2<f64>) -> (Duration, Result<Vec<usize>>) {
    let started = Instant::now();
    let outcome = model.fit(points);
    let elapsed = started.elapsed();
    debug!("timed fit of {} points: {elapsed:?}", points.nrows());
    (elapsed, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn record_keeps_labels_and_scores_them() {
        let record = RunRecord::from_fit(
            "Default",
            "default",
            0.0,
            Duration::from_millis(3),
            Ok(vec![1, 1, 0, 0]),
            vec![0, 0, 1, 1],
            None,
        );
        assert_eq!(record.n_points, 4);
        assert!(!record.timed_out);
        assert_eq!(record.ari(), Some(1.0));
    }

    #[test]
    fn timed_out_and_failed_runs_have_no_labels() {
        let slow = RunRecord::from_fit(
            "Default",
            "default",
            0.1,
            Duration::from_secs(2),
            Ok(vec![0, 1]),
            vec![0, 1],
            Some(Duration::from_secs(1)),
        );
        assert!(slow.timed_out);
        assert_eq!(slow.ari(), None);

        let failed = RunRecord::from_fit(
            "Default",
            "default",
            0.1,
            Duration::ZERO,
            Err(Error::EmptyInput),
            vec![0, 1],
            None,
        );
        assert!(!failed.timed_out);
        assert!(failed.predicted.is_none());
    }

    #[test]
    fn memory_sink_averages_per_variant() {
        let mut sink = MemorySink::new();
        for (variant, ms) in [("a", 2), ("a", 4), ("b", 10)] {
            let record = RunRecord::from_fit(
                "Decomposition",
                variant,
                0.0,
                Duration::from_millis(ms),
                Ok(vec![0]),
                vec![0],
                None,
            );
            sink.record(record).unwrap();
        }
        assert_eq!(sink.records().len(), 3);
        assert_eq!(sink.mean_elapsed("a"), Some(Duration::from_millis(3)));
        assert_eq!(sink.mean_elapsed("missing"), None);
    }

    #[test]
    fn timed_fit_reports_fit_errors() {
        let model = SpectralClustering::with_defaults(2).unwrap();
        let (_, outcome) = timed_fit(&model, &Array2::zeros((0, 2)));
        assert_eq!(outcome, Err(Error::EmptyInput));
    }
}
