//! Optional per-feature rescaling of the point matrix.

use log::debug;
use ndarray::{Array2, Axis};

use crate::config::Standardisation;
use crate::error::Result;
use crate::pipeline::{Artifact, Diagnostics, Stage};

/// Columns whose spread is below this are treated as constant.
const SPREAD_EPS: f64 = 1e-12;

/// Rescale the columns of `points` according to `method`.
///
/// `Standardisation::None` returns the input unchanged (bit-for-bit).
/// Constant columns map to 0 under both z-score and min-max.
pub fn standardise(points: Array2<f64>, method: Standardisation) -> Array2<f64> {
    match method {
        Standardisation::None => points,
        Standardisation::ZScore => zscore(points),
        Standardisation::MinMax => min_max(points),
    }
}

fn zscore(mut points: Array2<f64>) -> Array2<f64> {
    let n = points.nrows() as f64;
    for mut column in points.axis_iter_mut(Axis(1)) {
        let mean = column.sum() / n;
        let var = column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        if std > SPREAD_EPS {
            column.mapv_inplace(|x| (x - mean) / std);
        } else {
            column.fill(0.0);
        }
    }
    points
}

fn min_max(mut points: Array2<f64>) -> Array2<f64> {
    for mut column in points.axis_iter_mut(Axis(1)) {
        let (lo, hi) = column
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });
        let range = hi - lo;
        if range > SPREAD_EPS {
            column.mapv_inplace(|x| (x - lo) / range);
        } else {
            column.fill(0.0);
        }
    }
    points
}

/// Standardisation stage.
#[derive(Debug, Clone, Copy)]
pub struct StandardiseStage {
    method: Standardisation,
}

impl StandardiseStage {
    /// Create the stage.
    pub fn new(method: Standardisation) -> Self {
        Self { method }
    }
}

impl Stage for StandardiseStage {
    fn name(&self) -> &'static str {
        "standardisation"
    }

    fn transform(&self, input: Artifact, _: &mut Diagnostics) -> Result<Artifact> {
        let points = input.into_points(self.name())?;
        debug!(
            "standardising {}x{} points with {}",
            points.nrows(),
            points.ncols(),
            self.method
        );
        Ok(Artifact::Points(standardise(points, self.method)))
    }
}
