// src/algorithms/discernibility.rs

use crate::core::{Dataset, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Pairwise discernibility of records with different decisions.
///
/// Cell (i, j) holds the criteria on which records i and j differ, and is
/// empty when they share a decision value (or differ on nothing).
#[derive(Debug, Clone, Serialize)]
pub struct DiscernibilityMatrix {
    size: usize,
    cells: Vec<BTreeSet<String>>,
}

impl DiscernibilityMatrix {
    pub fn build<S: AsRef<str>>(data: &Dataset, criteria: &[S], target: &str) -> Result<Self> {
        let criteria_idx = data.require_columns(criteria)?;
        let target_idx = data.require_column(target)?;
        let rows = data.rows();
        let size = rows.len();
        let mut cells = vec![BTreeSet::new(); size * size];

        for i in 0..size {
            for j in (i + 1)..size {
                if rows[i][target_idx] == rows[j][target_idx] {
                    continue;
                }
                let differences: BTreeSet<String> = criteria
                    .iter()
                    .zip(&criteria_idx)
                    .filter(|(_, c)| rows[i][**c] != rows[j][**c])
                    .map(|(name, _)| name.as_ref().to_string())
                    .collect();
                cells[i * size + j] = differences.clone();
                cells[j * size + i] = differences;
            }
        }

        Ok(DiscernibilityMatrix { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell(&self, i: usize, j: usize) -> Option<&BTreeSet<String>> {
        if i < self.size && j < self.size {
            Some(&self.cells[i * self.size + j])
        } else {
            None
        }
    }

    /// The discernibility function as a conjunction of disjunctions.
    ///
    /// Single-criterion cells become bare terms first; any other cell that
    /// shares no criterion with those terms contributes `(a ∨ b)`. Terms are
    /// de-duplicated, sorted, and joined with ` ∧ `.
    pub fn simplified_expression(&self) -> String {
        let mut terms: BTreeSet<String> = BTreeSet::new();
        let mut used: BTreeSet<&str> = BTreeSet::new();

        for cell in &self.cells {
            if cell.len() == 1 {
                if let Some(only) = cell.iter().next() {
                    used.insert(only.as_str());
                    terms.insert(only.clone());
                }
            }
        }

        for cell in &self.cells {
            if cell.is_empty() || cell.iter().any(|c| used.contains(c.as_str())) {
                continue;
            }
            let alternatives: Vec<&str> = cell.iter().map(String::as_str).collect();
            terms.insert(format!("({})", alternatives.join(" ∨ ")));
        }

        terms.into_iter().collect::<Vec<_>>().join(" ∧ ")
    }
}

impl fmt::Display for DiscernibilityMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.size {
            let row: Vec<String> = (0..self.size)
                .map(|j| {
                    let cell = &self.cells[i * self.size + j];
                    if cell.is_empty() {
                        "Ø".to_string()
                    } else {
                        cell.iter().cloned().collect::<Vec<_>>().join(",")
                    }
                })
                .collect();
            writeln!(f, "{}", row.join("\t"))?;
        }
        Ok(())
    }
}
