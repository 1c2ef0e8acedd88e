// src/algorithms/id3.rs

//! ID3 decision-tree induction over categorical tables.
//!
//! The tree is grown top-down: at each step the remaining non-target column
//! with the largest impurity reduction becomes the split, its observed values
//! become the edges, and the column is dropped for the subtrees.

use crate::core::{Dataset, GraphDescription, MiningError, NodeKind, Result, Sample, Value};
use crate::traits::{Classifier, ToGraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Impurity measure used to choose splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitMethod {
    /// Entropy reduction (information gain).
    #[default]
    Gain,
    /// Gini-index reduction.
    Gini,
}

impl SplitMethod {
    fn impurity(self, values: &[&Value]) -> f64 {
        match self {
            SplitMethod::Gain => entropy(values),
            SplitMethod::Gini => gini(values),
        }
    }
}

/// Value frequencies in first-encountered order.
fn frequencies<'a>(values: &[&'a Value]) -> Vec<(&'a Value, usize)> {
    let mut counts: Vec<(&Value, usize)> = Vec::new();
    for &v in values {
        match counts.iter_mut().find(|(seen, _)| *seen == v) {
            Some((_, n)) => *n += 1,
            None => counts.push((v, 1)),
        }
    }
    counts
}

/// Shannon entropy in bits: `-Σ p·log2(p)`. Zero for an empty slice.
pub fn entropy(values: &[&Value]) -> f64 {
    let total = values.len() as f64;
    frequencies(values)
        .into_iter()
        .map(|(_, n)| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Gini index: `1 - Σ p²`. Zero for an empty slice.
pub fn gini(values: &[&Value]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total = values.len() as f64;
    1.0 - frequencies(values)
        .into_iter()
        .map(|(_, n)| (n as f64 / total).powi(2))
        .sum::<f64>()
}

/// Impurity of `target` minus the size-weighted impurity of `target`
/// within each partition of `feature`.
pub fn split_gain(data: &Dataset, target: &str, feature: &str, method: SplitMethod) -> Result<f64> {
    let target_idx = data.require_column(target)?;
    let feature_idx = data.require_column(feature)?;
    let rows = data.rows();
    let total = rows.len() as f64;

    let parent: Vec<&Value> = rows.iter().map(|r| &r[target_idx]).collect();
    let mut weighted = 0.0;
    let feature_values: Vec<&Value> = rows.iter().map(|r| &r[feature_idx]).collect();
    for (value, count) in frequencies(&feature_values) {
        let subset: Vec<&Value> = rows
            .iter()
            .filter(|r| &r[feature_idx] == value)
            .map(|r| &r[target_idx])
            .collect();
        weighted += (count as f64 / total) * method.impurity(&subset);
    }
    Ok(method.impurity(&parent) - weighted)
}

/// A built ID3 tree. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DecisionTree {
    Node {
        attribute: String,
        edges: BTreeMap<Value, DecisionTree>,
    },
    Leaf {
        label: Value,
    },
}

/// One root-to-leaf path of a tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRule {
    pub conditions: Vec<(String, Value)>,
    pub outcome: Value,
}

impl fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return write!(f, "ALWAYS {}", self.outcome);
        }
        let conditions: Vec<String> = self
            .conditions
            .iter()
            .map(|(attr, value)| format!("{} = {}", attr, value))
            .collect();
        write!(f, "IF {} THEN {}", conditions.join(" AND "), self.outcome)
    }
}

impl DecisionTree {
    pub fn is_leaf(&self) -> bool {
        matches!(self, DecisionTree::Leaf { .. })
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            DecisionTree::Leaf { .. } => 0,
            DecisionTree::Node { edges, .. } => {
                1 + edges.values().map(DecisionTree::depth).max().unwrap_or(0)
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            DecisionTree::Leaf { .. } => 1,
            DecisionTree::Node { edges, .. } => edges.values().map(DecisionTree::leaf_count).sum(),
        }
    }

    /// Follows the branches matching `sample` down to a leaf.
    pub fn classify(&self, sample: &Sample) -> Result<Value> {
        let mut node = self;
        loop {
            match node {
                DecisionTree::Leaf { label } => return Ok(label.clone()),
                DecisionTree::Node { attribute, edges } => {
                    let value = sample
                        .get(attribute)
                        .ok_or_else(|| MiningError::unknown_attribute(attribute.as_str()))?;
                    node = edges.get(value).ok_or_else(|| MiningError::NoMatchingBranch {
                        attribute: attribute.clone(),
                        value: value.to_string(),
                    })?;
                }
            }
        }
    }

    pub fn rules(&self) -> Vec<DecisionRule> {
        let mut rules = Vec::new();
        self.collect_rules(&mut Vec::new(), &mut rules);
        rules
    }

    fn collect_rules(&self, path: &mut Vec<(String, Value)>, out: &mut Vec<DecisionRule>) {
        match self {
            DecisionTree::Leaf { label } => out.push(DecisionRule {
                conditions: path.clone(),
                outcome: label.clone(),
            }),
            DecisionTree::Node { attribute, edges } => {
                for (value, child) in edges {
                    path.push((attribute.clone(), value.clone()));
                    child.collect_rules(path, out);
                    path.pop();
                }
            }
        }
    }

    fn add_to_graph(&self, graph: &mut GraphDescription, next_id: &mut usize) -> String {
        let id = format!("n{}", *next_id);
        *next_id += 1;
        match self {
            DecisionTree::Leaf { label } => {
                graph.add_node(id.clone(), label.to_string(), NodeKind::Leaf);
            }
            DecisionTree::Node { attribute, edges } => {
                graph.add_node(id.clone(), attribute.clone(), NodeKind::Decision);
                for (value, child) in edges {
                    let child_id = child.add_to_graph(graph, next_id);
                    graph.add_edge(id.clone(), child_id, Some(value.to_string()));
                }
            }
        }
        id
    }
}

impl ToGraph for DecisionTree {
    fn to_graph(&self) -> GraphDescription {
        let mut graph = GraphDescription::new();
        let mut next_id = 0;
        self.add_to_graph(&mut graph, &mut next_id);
        graph
    }
}

impl fmt::Display for DecisionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn walk(tree: &DecisionTree, indent: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match tree {
                DecisionTree::Leaf { label } => writeln!(f, "{:indent$}-> {}", "", label, indent = indent),
                DecisionTree::Node { attribute, edges } => {
                    writeln!(f, "{:indent$}[{}]", "", attribute, indent = indent)?;
                    for (value, child) in edges {
                        writeln!(f, "{:indent$}= {}", "", value, indent = indent + 2)?;
                        walk(child, indent + 4, f)?;
                    }
                    Ok(())
                }
            }
        }
        walk(self, 0, f)
    }
}

/// ID3 engine holding the most recently built tree.
#[derive(Debug, Clone, Default)]
pub struct Id3 {
    tree: Option<DecisionTree>,
}

impl Id3 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> Option<&DecisionTree> {
        self.tree.as_ref()
    }

    /// Builds a tree predicting `target` from every other column, replacing
    /// any previous tree.
    pub fn build_tree(&mut self, data: &Dataset, target: &str, method: SplitMethod) -> Result<&DecisionTree> {
        if data.is_empty() {
            return Err(MiningError::invalid_dataset("cannot build a tree from an empty dataset"));
        }
        if !data.has_column(target) {
            return Err(MiningError::invalid_dataset(format!(
                "target column '{}' is missing",
                target
            )));
        }

        let tree = grow(data, target, method, 0)?;
        info!(
            target,
            ?method,
            depth = tree.depth(),
            leaves = tree.leaf_count(),
            "decision tree built"
        );
        Ok(&*self.tree.insert(tree))
    }

    pub fn reset(&mut self) {
        self.tree = None;
    }
}

impl Classifier for Id3 {
    fn classify(&self, sample: &Sample) -> Result<Value> {
        self.tree
            .as_ref()
            .ok_or(MiningError::ModelNotTrained)?
            .classify(sample)
    }
}

fn grow(data: &Dataset, target: &str, method: SplitMethod, depth: usize) -> Result<DecisionTree> {
    let target_values = data.column(target)?;
    let counts = frequencies(&target_values);

    if counts.len() == 1 {
        return Ok(DecisionTree::Leaf {
            label: counts[0].0.clone(),
        });
    }

    if data.ncols() == 1 {
        // Mode; the earliest value wins a tie.
        let mut mode = counts[0];
        for &(value, n) in &counts[1..] {
            if n > mode.1 {
                mode = (value, n);
            }
        }
        return Ok(DecisionTree::Leaf {
            label: mode.0.clone(),
        });
    }

    let mut best: Option<(&str, f64)> = None;
    for feature in data.columns().iter().filter(|c| c.as_str() != target) {
        let gain = split_gain(data, target, feature, method)?;
        if best.map_or(true, |(_, top)| gain > top) {
            best = Some((feature.as_str(), gain));
        }
    }
    let (attribute, gain) = best.ok_or_else(|| MiningError::invalid_dataset("no column to split on"))?;
    debug!(depth, attribute, gain, "split chosen");

    let idx = data.require_column(attribute)?;
    let split_values: Vec<&Value> = data.rows().iter().map(|r| &r[idx]).collect();
    let mut edges = BTreeMap::new();
    for (value, _) in frequencies(&split_values) {
        let subset = data
            .filter_rows(|r| &r[idx] == value)
            .without_column(attribute)?;
        edges.insert(value.clone(), grow(&subset, target, method, depth + 1)?);
    }

    Ok(DecisionTree::Node {
        attribute: attribute.to_string(),
        edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use approx::assert_abs_diff_eq;

    fn play_tennis() -> Result<Dataset> {
        Dataset::from_rows(
            ["Outlook", "Temperature", "Humidity", "Wind", "Play"],
            vec![
                row!["Sunny", "Hot", "High", "Weak", "No"],
                row!["Sunny", "Hot", "High", "Strong", "No"],
                row!["Overcast", "Hot", "High", "Weak", "Yes"],
                row!["Rain", "Mild", "High", "Weak", "Yes"],
                row!["Rain", "Cool", "Normal", "Weak", "Yes"],
                row!["Rain", "Cool", "Normal", "Strong", "No"],
                row!["Overcast", "Cool", "Normal", "Strong", "Yes"],
                row!["Sunny", "Mild", "High", "Weak", "No"],
                row!["Sunny", "Cool", "Normal", "Weak", "Yes"],
                row!["Rain", "Mild", "Normal", "Weak", "Yes"],
                row!["Sunny", "Mild", "Normal", "Strong", "Yes"],
                row!["Overcast", "Mild", "High", "Strong", "Yes"],
                row!["Overcast", "Hot", "Normal", "Weak", "Yes"],
                row!["Rain", "Mild", "High", "Strong", "No"],
            ],
        )
    }

    fn sample(pairs: &[(&str, &str)]) -> Sample {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[test]
    fn impurity_measures() -> Result<()> {
        let data = play_tennis()?;
        let play = data.column("Play")?;
        assert_abs_diff_eq!(entropy(&play), 0.940_285_958_670_631, epsilon = 1e-12);
        assert_abs_diff_eq!(gini(&play), 1.0 - (81.0 + 25.0) / 196.0, epsilon = 1e-12);
        assert_eq!(entropy(&[]), 0.0);
        assert_eq!(gini(&[]), 0.0);

        let outlook = split_gain(&data, "Play", "Outlook", SplitMethod::Gain)?;
        assert_abs_diff_eq!(outlook, 0.246_749_819_774_439_5, epsilon = 1e-9);
        let wind = split_gain(&data, "Play", "Wind", SplitMethod::Gain)?;
        assert!(wind < outlook);
        Ok(())
    }

    #[test]
    fn builds_the_textbook_tree() -> Result<()> {
        let mut id3 = Id3::new();
        let tree = id3.build_tree(&play_tennis()?, "Play", SplitMethod::Gain)?.clone();

        let DecisionTree::Node { attribute, edges } = &tree else {
            panic!("expected a split at the root");
        };
        assert_eq!(attribute, "Outlook");
        assert_eq!(edges.len(), 3);
        assert_eq!(
            edges[&Value::from("Overcast")],
            DecisionTree::Leaf { label: Value::from("Yes") }
        );
        assert!(matches!(
            &edges[&Value::from("Sunny")],
            DecisionTree::Node { attribute, .. } if attribute == "Humidity"
        ));
        assert!(matches!(
            &edges[&Value::from("Rain")],
            DecisionTree::Node { attribute, .. } if attribute == "Wind"
        ));
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.leaf_count(), 5);
        Ok(())
    }

    #[test]
    fn gini_picks_the_same_root() -> Result<()> {
        let mut id3 = Id3::new();
        let tree = id3.build_tree(&play_tennis()?, "Play", SplitMethod::Gini)?;
        assert!(matches!(tree, DecisionTree::Node { attribute, .. } if attribute == "Outlook"));
        Ok(())
    }

    #[test]
    fn constant_target_is_a_single_leaf() -> Result<()> {
        let data = Dataset::from_rows(
            ["Color", "Label"],
            vec![row!["Red", "A"], row!["Blue", "A"]],
        )?;
        let mut id3 = Id3::new();
        let tree = id3.build_tree(&data, "Label", SplitMethod::Gain)?;
        assert_eq!(tree, &DecisionTree::Leaf { label: Value::from("A") });
        Ok(())
    }

    #[test]
    fn exhausted_columns_fall_back_to_first_mode() -> Result<()> {
        let data = Dataset::from_rows(
            ["Color", "Label"],
            vec![row!["Red", "B"], row!["Red", "A"], row!["Red", "A"], row!["Red", "B"]],
        )?;
        let mut id3 = Id3::new();
        let tree = id3.build_tree(&data, "Label", SplitMethod::Gain)?;
        let DecisionTree::Node { edges, .. } = tree else {
            panic!("expected a split");
        };
        assert_eq!(
            edges[&Value::from("Red")],
            DecisionTree::Leaf { label: Value::from("B") }
        );
        Ok(())
    }

    #[test]
    fn rejects_empty_data_and_missing_target() -> Result<()> {
        let mut id3 = Id3::new();
        let empty = Dataset::new(["a", "b"])?;
        assert!(matches!(
            id3.build_tree(&empty, "b", SplitMethod::Gain),
            Err(MiningError::InvalidDataset(_))
        ));
        assert!(matches!(
            id3.build_tree(&play_tennis()?, "Verdict", SplitMethod::Gain),
            Err(MiningError::InvalidDataset(_))
        ));
        Ok(())
    }

    #[test]
    fn classifies_and_explains() -> Result<()> {
        let mut id3 = Id3::new();
        assert!(matches!(
            id3.classify(&Sample::new()),
            Err(MiningError::ModelNotTrained)
        ));

        id3.build_tree(&play_tennis()?, "Play", SplitMethod::Gain)?;
        let rainy_calm = sample(&[("Outlook", "Rain"), ("Wind", "Weak")]);
        assert_eq!(id3.classify(&rainy_calm)?, Value::from("Yes"));
        assert!(matches!(
            id3.classify(&sample(&[("Outlook", "Fog")])),
            Err(MiningError::NoMatchingBranch { .. })
        ));
        assert!(matches!(
            id3.classify(&sample(&[("Outlook", "Sunny")])),
            Err(MiningError::UnknownAttribute(_))
        ));

        let tree = id3.tree().unwrap();
        let rules = tree.rules();
        assert_eq!(rules.len(), 5);
        assert!(rules
            .iter()
            .any(|r| r.to_string() == "IF Outlook = Sunny AND Humidity = High THEN No"));

        let graph = tree.to_graph();
        assert_eq!(graph.nodes.len(), 8);
        assert_eq!(graph.edges.len(), 7);
        assert_eq!(graph.nodes[0].label, "Outlook");

        id3.reset();
        assert!(id3.tree().is_none());
        Ok(())
    }
}
