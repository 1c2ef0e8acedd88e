// src/algorithms/correlation.rs

use crate::core::{MiningError, Result};
use crate::utils::round_to;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Sign of a linear relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Positive,
    Negative,
    None,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Direction::Positive => "positive",
            Direction::Negative => "negative",
            Direction::None => "none",
        };
        write!(f, "{}", text)
    }
}

/// Descriptive statistics of two paired variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationSummary {
    pub mean_x: f64,
    pub mean_y: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std_x: f64,
    pub std_y: f64,
    pub n: usize,
}

impl fmt::Display for CorrelationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sample size: {}", self.n)?;
        writeln!(f, "Mean X: {}", round_to(self.mean_x, 3))?;
        writeln!(f, "Mean Y: {}", round_to(self.mean_y, 3))?;
        writeln!(f, "Std X: {}", round_to(self.std_x, 3))?;
        write!(f, "Std Y: {}", round_to(self.std_y, 3))
    }
}

/// Paired observations for Pearson correlation.
#[derive(Debug, Clone)]
pub struct Correlation {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Correlation {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.is_empty() || ys.is_empty() {
            return Err(MiningError::invalid_dataset("correlation needs at least one pair of values"));
        }
        if xs.len() != ys.len() {
            return Err(MiningError::SizeMismatch {
                left: xs.len(),
                right: ys.len(),
            });
        }
        Ok(Correlation { xs, ys })
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    pub fn summary(&self) -> Result<CorrelationSummary> {
        let n = self.len();
        if n < 2 {
            return Err(MiningError::invalid_dataset(format!(
                "standard deviation needs at least 2 points, got {}",
                n
            )));
        }
        let mean_x = Self::mean(&self.xs);
        let mean_y = Self::mean(&self.ys);
        let spread = |values: &[f64], mean: f64| {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
        };
        Ok(CorrelationSummary {
            mean_x,
            mean_y,
            std_x: spread(&self.xs, mean_x),
            std_y: spread(&self.ys, mean_y),
            n,
        })
    }

    /// Pearson's r, in [-1, 1].
    pub fn pearson(&self) -> Result<f64> {
        let mean_x = Self::mean(&self.xs);
        let mean_y = Self::mean(&self.ys);

        let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
        for (x, y) in self.xs.iter().zip(&self.ys) {
            let dx = x - mean_x;
            let dy = y - mean_y;
            cov += dx * dy;
            var_x += dx * dx;
            var_y += dy * dy;
        }
        if var_x == 0.0 || var_y == 0.0 {
            return Err(MiningError::invalid_dataset(
                "correlation is undefined when a variable has zero variance",
            ));
        }

        let r = (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0);
        debug!(n = self.len(), r, "pearson correlation");
        Ok(r)
    }

    pub fn direction(&self) -> Result<Direction> {
        let r = self.pearson()?;
        Ok(if r > 0.0 {
            Direction::Positive
        } else if r < 0.0 {
            Direction::Negative
        } else {
            Direction::None
        })
    }
}
