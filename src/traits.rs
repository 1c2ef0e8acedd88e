// src/traits.rs
use crate::core::{GraphDescription, Result, Sample, Value};

/// A trained model that assigns a class label to a sample.
pub trait Classifier {
    /// Predicts the class of `sample`.
    ///
    /// Fails with `ModelNotTrained` when nothing has been learned yet.
    fn classify(&self, sample: &Sample) -> Result<Value>;

    /// Classifies every sample in order, stopping at the first error.
    fn classify_all(&self, samples: &[Sample]) -> Result<Vec<Value>> {
        samples.iter().map(|s| self.classify(s)).collect()
    }
}

/// Results that can describe themselves as a node-and-edge list.
pub trait ToGraph {
    fn to_graph(&self) -> GraphDescription;
}
