// src/algorithms/rough_sets.rs

//! Rough-set approximations over a categorical table.
//!
//! Records are identified by the `ID` column. An attribute subset B groups
//! records that cannot be told apart on B into equivalence classes; every
//! other operation here is built from those classes.

use crate::core::{
    Dataset, GraphDescription, IdSet, MiningError, NodeKind, Result, Value, ID_COLUMN,
};
use crate::traits::ToGraph;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// Everything computed for one target set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoughSetReport {
    pub target: IdSet,
    pub lower: IdSet,
    pub upper: IdSet,
    pub boundary: IdSet,
    pub outside: IdSet,
    /// Dependency degree of the decision attribute on the chosen attributes.
    pub dependency: f64,
}

fn join_ids(ids: &IdSet) -> String {
    ids.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for RoughSetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lower(B, X): {{{}}}", join_ids(&self.lower))?;
        writeln!(f, "Upper(B, X): {{{}}}", join_ids(&self.upper))?;
        writeln!(f, "Boundary(B, X): {{{}}}", join_ids(&self.boundary))?;
        writeln!(f, "Outside(B, X): {{{}}}", join_ids(&self.outside))?;
        writeln!(f, "Gamma(B, C): {:.3}", self.dependency)
    }
}

impl ToGraph for RoughSetReport {
    fn to_graph(&self) -> GraphDescription {
        let mut graph = GraphDescription::new();
        let regions = [
            ("X", "X", &self.target),
            ("Upper", "Upper B X", &self.upper),
            ("Lower", "Lower B X", &self.lower),
            ("Boundary", "Boundary B X", &self.boundary),
            ("Outside", "Outside B X", &self.outside),
        ];
        for (id, title, ids) in regions {
            graph.add_node(id, format!("{}: {}", title, join_ids(ids)), NodeKind::Region);
        }
        graph.add_edge("X", "Upper", None);
        graph.add_edge("Upper", "Lower", None);
        graph.add_edge("Upper", "Boundary", None);
        graph.add_edge("X", "Outside", None);
        graph
    }
}

#[derive(Debug, Clone)]
pub struct RoughSet {
    data: Dataset,
    id_index: usize,
}

impl RoughSet {
    /// Wraps a dataset that carries an `ID` column with unique values.
    pub fn new(data: Dataset) -> Result<Self> {
        let id_index = data
            .column_index(ID_COLUMN)
            .ok_or_else(|| MiningError::MissingIdentifier(ID_COLUMN.to_string()))?;

        let mut seen = BTreeSet::new();
        for row in data.rows() {
            if !seen.insert(&row[id_index]) {
                return Err(MiningError::invalid_dataset(format!(
                    "identifier '{}' appears more than once",
                    row[id_index]
                )));
            }
        }

        Ok(RoughSet { data, id_index })
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    /// All record identifiers.
    pub fn universe(&self) -> IdSet {
        self.data
            .rows()
            .iter()
            .map(|r| r[self.id_index].clone())
            .collect()
    }

    /// Groups identifiers by their value tuple over `attributes`, keyed by
    /// that tuple.
    fn grouped<S: AsRef<str>>(&self, attributes: &[S]) -> Result<BTreeMap<Vec<&Value>, Vec<usize>>> {
        let indices = self.data.require_columns(attributes)?;
        let mut groups: BTreeMap<Vec<&Value>, Vec<usize>> = BTreeMap::new();
        for (r, row) in self.data.rows().iter().enumerate() {
            let key = indices.iter().map(|&i| &row[i]).collect();
            groups.entry(key).or_default().push(r);
        }
        Ok(groups)
    }

    fn ids_of(&self, rows: &[usize]) -> IdSet {
        rows.iter()
            .map(|&r| self.data.rows()[r][self.id_index].clone())
            .collect()
    }

    /// Equivalence classes induced by `attributes`, ordered by value tuple.
    pub fn equivalence_classes<S: AsRef<str>>(&self, attributes: &[S]) -> Result<Vec<IdSet>> {
        let groups = self.grouped(attributes)?;
        Ok(groups.values().map(|rows| self.ids_of(rows)).collect())
    }

    pub fn lower_approximation<S: AsRef<str>>(&self, target: &IdSet, attributes: &[S]) -> Result<IdSet> {
        let mut lower = IdSet::new();
        for class in self.equivalence_classes(attributes)? {
            if class.is_subset(target) {
                lower.extend(class);
            }
        }
        Ok(lower)
    }

    pub fn upper_approximation<S: AsRef<str>>(&self, target: &IdSet, attributes: &[S]) -> Result<IdSet> {
        let mut upper = IdSet::new();
        for class in self.equivalence_classes(attributes)? {
            if !class.is_disjoint(target) {
                upper.extend(class);
            }
        }
        Ok(upper)
    }

    pub fn boundary_region(&self, lower: &IdSet, upper: &IdSet) -> IdSet {
        upper.difference(lower).cloned().collect()
    }

    pub fn outside_region(&self, upper: &IdSet) -> IdSet {
        self.universe().difference(upper).cloned().collect()
    }

    /// Identifiers whose class under `conditions` has a single decision value.
    pub fn positive_region<S: AsRef<str>>(&self, decision: &str, conditions: &[S]) -> Result<IdSet> {
        let decision_index = self.data.require_column(decision)?;
        let mut positive = IdSet::new();
        for rows in self.grouped(conditions)?.values() {
            let first = &self.data.rows()[rows[0]][decision_index];
            if rows
                .iter()
                .all(|&r| &self.data.rows()[r][decision_index] == first)
            {
                positive.extend(self.ids_of(rows));
            }
        }
        Ok(positive)
    }

    /// γ(B, C): share of records in the positive region.
    pub fn dependency_degree<S: AsRef<str>>(&self, decision: &str, conditions: &[S]) -> Result<f64> {
        if self.data.is_empty() {
            return Err(MiningError::EmptyDataset(
                "cannot compute a dependency degree without records".to_string(),
            ));
        }
        let positive = self.positive_region(decision, conditions)?;
        let gamma = positive.len() as f64 / self.data.len() as f64;
        debug!(decision, positive = positive.len(), total = self.data.len(), gamma, "dependency degree");
        Ok(gamma)
    }

    /// Computes every region for `target` plus the dependency degree of
    /// `decision` on `attributes`.
    pub fn analyze<S: AsRef<str>>(&self, target: &IdSet, attributes: &[S], decision: &str) -> Result<RoughSetReport> {
        self.data.require_columns(attributes)?;
        self.data.require_column(decision)?;

        let lower = self.lower_approximation(target, attributes)?;
        let upper = self.upper_approximation(target, attributes)?;
        let dependency = self.dependency_degree(decision, attributes)?;
        let boundary = self.boundary_region(&lower, &upper);
        let outside = self.outside_region(&upper);

        Ok(RoughSetReport {
            target: target.clone(),
            lower,
            upper,
            boundary,
            outside,
            dependency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use approx::assert_abs_diff_eq;

    fn ids(values: &[i64]) -> IdSet {
        values.iter().map(|&v| Value::from(v)).collect()
    }

    fn patients() -> Result<RoughSet> {
        let data = Dataset::from_rows(
            ["ID", "Headache", "Temperature", "Flu"],
            vec![
                row![1, "Yes", "Normal", "No"],
                row![2, "Yes", "High", "Yes"],
                row![3, "Yes", "VeryHigh", "Yes"],
                row![4, "No", "Normal", "No"],
                row![5, "No", "High", "No"],
                row![6, "No", "VeryHigh", "Yes"],
                row![7, "No", "High", "Yes"],
                row![8, "No", "VeryHigh", "No"],
            ],
        )?;
        RoughSet::new(data)
    }

    #[test]
    fn requires_identifier_column() -> Result<()> {
        let data = Dataset::from_rows(["Name"], vec![row!["a"]])?;
        assert!(matches!(
            RoughSet::new(data),
            Err(MiningError::MissingIdentifier(_))
        ));
        Ok(())
    }

    #[test]
    fn rejects_repeated_identifiers() -> Result<()> {
        let data = Dataset::from_rows(["ID", "a"], vec![row![1, "x"], row![1, "y"]])?;
        assert!(matches!(
            RoughSet::new(data),
            Err(MiningError::InvalidDataset(_))
        ));
        Ok(())
    }

    #[test]
    fn classes_group_identical_rows() -> Result<()> {
        let rs = patients()?;
        let classes = rs.equivalence_classes(&["Headache", "Temperature"])?;
        assert_eq!(classes.len(), 6);
        assert!(classes.contains(&ids(&[5, 7])));
        assert!(classes.contains(&ids(&[6, 8])));
        assert!(classes.contains(&ids(&[1])));

        let everyone = rs.equivalence_classes::<&str>(&[])?;
        assert_eq!(everyone, vec![rs.universe()]);

        assert!(matches!(
            rs.equivalence_classes(&["Cough"]),
            Err(MiningError::UnknownAttribute(_))
        ));
        Ok(())
    }

    #[test]
    fn approximations_of_flu_cases() -> Result<()> {
        let rs = patients()?;
        let flu = ids(&[2, 3, 6, 7]);
        let b = ["Headache", "Temperature"];

        let lower = rs.lower_approximation(&flu, &b)?;
        let upper = rs.upper_approximation(&flu, &b)?;
        assert_eq!(lower, ids(&[2, 3]));
        assert_eq!(upper, ids(&[2, 3, 5, 6, 7, 8]));
        assert_eq!(rs.boundary_region(&lower, &upper), ids(&[5, 6, 7, 8]));
        assert_eq!(rs.outside_region(&upper), ids(&[1, 4]));
        Ok(())
    }

    #[test]
    fn dependency_degree_counts_consistent_classes() -> Result<()> {
        let rs = patients()?;
        let gamma = rs.dependency_degree("Flu", &["Headache", "Temperature"])?;
        // {1}, {2}, {3}, {4} decide Flu; {5,7} and {6,8} do not.
        assert_abs_diff_eq!(gamma, 0.5);
        assert_eq!(
            rs.positive_region("Flu", &["Headache", "Temperature"])?,
            ids(&[1, 2, 3, 4])
        );

        let full = rs.dependency_degree("Flu", &["ID"])?;
        assert_abs_diff_eq!(full, 1.0);

        assert!(matches!(
            rs.dependency_degree("Cough", &["Headache"]),
            Err(MiningError::UnknownAttribute(_))
        ));
        Ok(())
    }

    #[test]
    fn empty_table_has_no_dependency_degree() -> Result<()> {
        let rs = RoughSet::new(Dataset::new(["ID", "a", "d"])?)?;
        assert!(matches!(
            rs.dependency_degree("d", &["a"]),
            Err(MiningError::EmptyDataset(_))
        ));
        Ok(())
    }

    #[test]
    fn analyze_bundles_all_regions() -> Result<()> {
        let rs = patients()?;
        let report = rs.analyze(&ids(&[2, 3, 6, 7]), &["Headache", "Temperature"], "Flu")?;
        assert_eq!(report.lower, ids(&[2, 3]));
        assert_eq!(report.outside, ids(&[1, 4]));
        assert_abs_diff_eq!(report.dependency, 0.5);

        let text = report.to_string();
        assert!(text.contains("Lower(B, X): {2, 3}"));
        assert!(text.contains("Gamma(B, C): 0.500"));

        let graph = report.to_graph();
        assert_eq!(graph.nodes.len(), 5);
        assert_eq!(graph.edges.len(), 4);
        assert_eq!(
            graph.node("Outside").map(|n| n.label.as_str()),
            Some("Outside B X: 1, 4")
        );

        assert!(matches!(
            rs.analyze(&ids(&[1]), &["Headache"], "Cough"),
            Err(MiningError::UnknownAttribute(_))
        ));
        Ok(())
    }
}
