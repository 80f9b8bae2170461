//! Confidence estimation.
//!
//! Only the pass-through variant exists; the stage keeps its slot in the
//! pipeline so per-point scores can be added without changing the stage list.

use crate::config::Confidence;
use crate::error::Result;
use crate::pipeline::{Artifact, Diagnostics, Stage};

/// Confidence stage: labels → labels.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceStage {
    confidence: Confidence,
}

impl ConfidenceStage {
    /// Create the stage.
    pub fn new(confidence: Confidence) -> Self {
        Self { confidence }
    }
}

impl Stage for ConfidenceStage {
    fn name(&self) -> &'static str {
        "confidence"
    }

    fn transform(&self, input: Artifact, _: &mut Diagnostics) -> Result<Artifact> {
        match self.confidence {
            Confidence::None => input.into_labels(self.name()).map(Artifact::Labels),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn labels_pass_through_unchanged() {
        let stage = ConfidenceStage::new(Confidence::None);
        let out = stage
            .transform(Artifact::Labels(vec![1, 0, 1]), &mut Diagnostics::default())
            .unwrap();
        assert_eq!(out, Artifact::Labels(vec![1, 0, 1]));
    }

    #[test]
    fn rejects_non_labels() {
        let stage = ConfidenceStage::new(Confidence::None);
        let err = stage
            .transform(Artifact::Embedding(Array2::zeros((2, 1))), &mut Diagnostics::default())
            .unwrap_err();
        assert!(err.to_string().contains("confidence"));
    }
}
