// src/algorithms/naive_bayes.rs

use crate::core::{Dataset, MiningError, Result, Sample, Value};
use crate::traits::Classifier;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Probability used for an unsmoothed value never seen in training.
const UNSEEN_PROBABILITY: f64 = 1e-6;

/// Learned conditional probabilities for one feature column.
#[derive(Debug, Clone)]
struct FeatureTable {
    name: String,
    /// Every value observed for this feature, across all classes.
    values: BTreeSet<Value>,
    /// class -> value -> P(value | class)
    conditionals: HashMap<Value, HashMap<Value, f64>>,
}

impl FeatureTable {
    fn unseen_log_probability(&self, smoothing: bool) -> f64 {
        if smoothing {
            (1.0 / (self.values.len() as f64 + 1.0)).ln()
        } else {
            UNSEEN_PROBABILITY.ln()
        }
    }
}

#[derive(Debug, Clone)]
struct Model {
    smoothing: bool,
    /// Class labels in first-encountered order.
    classes: Vec<Value>,
    priors: HashMap<Value, f64>,
    features: Vec<FeatureTable>,
}

/// Categorical Naive Bayes with optional Laplace smoothing.
///
/// Lifecycle: `new` → `fit` → `predict`* → `reset` (optional) → `fit` again.
#[derive(Debug, Clone, Default)]
pub struct NaiveBayes {
    model: Option<Model>,
}

impl NaiveBayes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Learns priors and per-feature conditional tables.
    ///
    /// Every column of `features` is a feature; `labels[i]` is the class of
    /// row `i`. Refitting replaces any earlier model.
    pub fn fit(&mut self, features: &Dataset, labels: &[Value], smoothing: bool) -> Result<()> {
        if features.is_empty() || features.ncols() == 0 || labels.is_empty() {
            return Err(MiningError::EmptyTrainingSet);
        }
        if features.len() != labels.len() {
            return Err(MiningError::SizeMismatch {
                left: features.len(),
                right: labels.len(),
            });
        }

        let n_samples = labels.len() as f64;
        let mut classes: Vec<Value> = Vec::new();
        let mut class_counts: HashMap<Value, usize> = HashMap::new();
        for label in labels {
            let count = class_counts.entry(label.clone()).or_insert(0);
            if *count == 0 {
                classes.push(label.clone());
            }
            *count += 1;
        }
        let priors = class_counts
            .iter()
            .map(|(c, &n)| (c.clone(), n as f64 / n_samples))
            .collect();

        let mut tables = Vec::with_capacity(features.ncols());
        for (col, name) in features.columns().iter().enumerate() {
            let mut values = BTreeSet::new();
            let mut counts: HashMap<&Value, HashMap<&Value, usize>> = HashMap::new();
            for (row, label) in features.rows().iter().zip(labels) {
                let value = &row[col];
                values.insert(value.clone());
                *counts.entry(label).or_default().entry(value).or_insert(0) += 1;
            }

            let distinct = values.len() as f64;
            let mut conditionals = HashMap::with_capacity(classes.len());
            for class in &classes {
                let total = class_counts[class] as f64;
                let observed = counts.get(class);
                let table: HashMap<Value, f64> = values
                    .iter()
                    .map(|v| {
                        let count = observed.and_then(|m| m.get(v)).copied().unwrap_or(0) as f64;
                        let p = if smoothing {
                            (count + 1.0) / (total + distinct)
                        } else {
                            count / total
                        };
                        (v.clone(), p)
                    })
                    .collect();
                conditionals.insert(class.clone(), table);
            }

            debug!(feature = %name, distinct = values.len(), "conditional table built");
            tables.push(FeatureTable {
                name: name.clone(),
                values,
                conditionals,
            });
        }

        info!(
            samples = labels.len(),
            classes = classes.len(),
            features = tables.len(),
            smoothing,
            "naive bayes trained"
        );

        self.model = Some(Model {
            smoothing,
            classes,
            priors,
            features: tables,
        });
        Ok(())
    }

    fn model(&self) -> Result<&Model> {
        self.model.as_ref().ok_or(MiningError::ModelNotTrained)
    }

    /// Class labels in first-encountered order.
    pub fn classes(&self) -> Result<&[Value]> {
        Ok(&self.model()?.classes)
    }

    pub fn prior(&self, class: &Value) -> Result<Option<f64>> {
        Ok(self.model()?.priors.get(class).copied())
    }

    /// P(value | class) for a trained feature, if the value was observed.
    pub fn conditional(&self, feature: &str, class: &Value, value: &Value) -> Result<Option<f64>> {
        let model = self.model()?;
        let table = model
            .features
            .iter()
            .find(|t| t.name == feature)
            .ok_or_else(|| MiningError::unknown_attribute(feature))?;
        Ok(table
            .conditionals
            .get(class)
            .and_then(|m| m.get(value))
            .copied())
    }

    /// Summed log-posterior per class, in class order.
    pub fn log_scores(&self, sample: &Sample) -> Result<Vec<(Value, f64)>> {
        let model = self.model()?;
        for key in sample.keys() {
            if !model.features.iter().any(|t| &t.name == key) {
                return Err(MiningError::unknown_attribute(key.as_str()));
            }
        }

        let scores = model
            .classes
            .iter()
            .map(|class| {
                let mut score = model.priors[class].ln();
                for table in &model.features {
                    let Some(value) = sample.get(&table.name) else {
                        continue;
                    };
                    score += match table.conditionals[class].get(value) {
                        Some(p) => p.ln(),
                        None => table.unseen_log_probability(model.smoothing),
                    };
                }
                (class.clone(), score)
            })
            .collect();
        Ok(scores)
    }

    /// The class with the highest log-score; the earliest class wins a tie.
    pub fn predict(&self, sample: &Sample) -> Result<Value> {
        let mut best: Option<(Value, f64)> = None;
        for (class, score) in self.log_scores(sample)? {
            let better = best.as_ref().map_or(true, |(_, top)| score > *top);
            if better {
                best = Some((class, score));
            }
        }
        best.map(|(class, _)| class)
            .ok_or(MiningError::ModelNotTrained)
    }

    /// Forgets everything learned. Safe to call repeatedly.
    pub fn reset(&mut self) {
        self.model = None;
    }
}

impl Classifier for NaiveBayes {
    fn classify(&self, sample: &Sample) -> Result<Value> {
        self.predict(sample)
    }
}
