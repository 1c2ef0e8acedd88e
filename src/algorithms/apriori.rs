// src/algorithms/apriori.rs

//! Frequent itemsets and association rules.
//!
//! Discovery is level-wise: frequent k-itemsets that agree on their first
//! k-1 items are joined into (k+1)-candidates, and a candidate is counted
//! only if every k-subset of it is already frequent.

use crate::core::{Dataset, MiningError, Result, Value, ID_COLUMN};
use crate::utils::round_to;
use ndarray::Array2;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, info};

/// Column holding one item per row in transaction tables.
pub const ITEMS_COLUMN: &str = "items";

pub type Itemset = BTreeSet<String>;

fn join_items(items: &Itemset) -> String {
    items.iter().cloned().collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequentItemset {
    pub items: Itemset,
    /// Fraction of transactions containing every item.
    pub support: f64,
    /// Number of transactions containing every item.
    pub count: usize,
}

impl FrequentItemset {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for FrequentItemset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} support={}", join_items(&self.items), round_to(self.support, 3))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationRule {
    pub antecedent: Itemset,
    pub consequent: Itemset,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    pub support: f64,
    pub confidence: f64,
}

impl fmt::Display for AssociationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}} => {{{}}} (antecedent support={}, consequent support={}, support={}, confidence={})",
            join_items(&self.antecedent),
            join_items(&self.consequent),
            round_to(self.antecedent_support, 3),
            round_to(self.consequent_support, 3),
            round_to(self.support, 3),
            round_to(self.confidence, 3)
        )
    }
}

/// One-hot view of a transaction list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryMatrix {
    /// `o1`, `o2`, ... in transaction order.
    pub transaction_ids: Vec<String>,
    /// Distinct items, sorted; column order of `cells`.
    pub items: Vec<String>,
    /// `cells[[t, i]]` is true iff transaction `t` contains item `i`.
    pub cells: Array2<bool>,
}

impl BinaryMatrix {
    pub fn n_transactions(&self) -> usize {
        self.cells.nrows()
    }

    /// Number of transactions containing every item at `columns`.
    fn hits(&self, columns: &[usize]) -> usize {
        self.cells
            .outer_iter()
            .filter(|row| columns.iter().all(|&c| row[c]))
            .count()
    }
}

/// Apriori engine for one analysis session.
#[derive(Debug, Clone, Default)]
pub struct Apriori {
    min_sup: Option<f64>,
    min_conf: Option<f64>,
    transactions: Vec<Vec<String>>,
    frequent: Option<Vec<FrequentItemset>>,
    rules: Vec<AssociationRule>,
}

impl Apriori {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_params(&mut self, min_sup: f64, min_conf: Option<f64>) -> Result<()> {
        if !(min_sup > 0.0 && min_sup <= 1.0) {
            return Err(MiningError::invalid_parameter(format!(
                "min_sup must be in (0, 1], got {}",
                min_sup
            )));
        }
        if let Some(conf) = min_conf {
            if !(conf > 0.0 && conf <= 1.0) {
                return Err(MiningError::invalid_parameter(format!(
                    "min_conf must be in (0, 1], got {}",
                    conf
                )));
            }
        }
        self.min_sup = Some(min_sup);
        self.min_conf = min_conf;
        Ok(())
    }

    pub fn min_sup(&self) -> Option<f64> {
        self.min_sup
    }

    pub fn min_conf(&self) -> Option<f64> {
        self.min_conf
    }

    /// Groups the `items` column by `ID`, one item list per identifier,
    /// ordered by identifier.
    pub fn prepare_transactions(&mut self, data: &Dataset) -> Result<&[Vec<String>]> {
        let (Some(id_idx), Some(item_idx)) = (data.column_index(ID_COLUMN), data.column_index(ITEMS_COLUMN)) else {
            return Err(MiningError::MissingColumns(vec![
                ID_COLUMN.to_string(),
                ITEMS_COLUMN.to_string(),
            ]));
        };

        let mut grouped: BTreeMap<&Value, Vec<String>> = BTreeMap::new();
        for row in data.rows() {
            grouped
                .entry(&row[id_idx])
                .or_default()
                .push(row[item_idx].to_string());
        }
        self.transactions = grouped.into_values().collect();
        debug!(transactions = self.transactions.len(), "transactions prepared");
        Ok(self.transactions.as_slice())
    }

    pub fn transactions(&self) -> &[Vec<String>] {
        &self.transactions
    }

    pub fn to_binary_matrix(&self, transactions: &[Vec<String>]) -> BinaryMatrix {
        let items: Vec<String> = transactions
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let column: HashMap<&str, usize> = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.as_str(), i))
            .collect();

        let mut cells = Array2::from_elem((transactions.len(), items.len()), false);
        for (t, transaction) in transactions.iter().enumerate() {
            for item in transaction {
                cells[[t, column[item.as_str()]]] = true;
            }
        }

        BinaryMatrix {
            transaction_ids: (1..=transactions.len()).map(|i| format!("o{}", i)).collect(),
            items,
            cells,
        }
    }

    /// All itemsets with support ≥ `min_sup`, ordered by size then items.
    pub fn find_frequent_itemsets(&mut self, matrix: &BinaryMatrix) -> Result<&[FrequentItemset]> {
        let min_sup = self
            .min_sup
            .ok_or_else(|| MiningError::invalid_parameter("min_sup has not been set; call set_params() first"))?;
        if matrix.n_transactions() == 0 {
            return Err(MiningError::invalid_dataset("the binary matrix has no transactions"));
        }

        let mut found: Vec<FrequentItemset> = Vec::new();

        // Itemsets are kept as sorted column indices while searching.
        let mut level: Vec<Vec<usize>> = Vec::new();
        let n = matrix.n_transactions() as f64;
        for c in 0..matrix.items.len() {
            let count = matrix.hits(&[c]);
            if count as f64 / n >= min_sup {
                level.push(vec![c]);
                found.push(to_itemset(matrix, &[c], count));
            }
        }

        let mut size = 1;
        while !level.is_empty() {
            debug!(size, frequent = level.len(), "apriori level");
            let frequent_here: BTreeSet<&[usize]> = level.iter().map(Vec::as_slice).collect();
            let mut next = Vec::new();
            for (a, left) in level.iter().enumerate() {
                for right in &level[a + 1..] {
                    if left[..size - 1] != right[..size - 1] {
                        continue;
                    }
                    let mut candidate = left.clone();
                    candidate.push(right[size - 1]);
                    candidate.sort_unstable();
                    if !all_subsets_frequent(&candidate, &frequent_here) {
                        continue;
                    }
                    let count = matrix.hits(&candidate);
                    if count as f64 / n >= min_sup {
                        found.push(to_itemset(matrix, &candidate, count));
                        next.push(candidate);
                    }
                }
            }
            next.sort();
            level = next;
            size += 1;
        }

        found.sort_by(|a, b| a.items.len().cmp(&b.items.len()).then_with(|| a.items.cmp(&b.items)));
        info!(min_sup, itemsets = found.len(), "frequent itemsets found");
        Ok(self.frequent.insert(found).as_slice())
    }

    pub fn frequent_itemsets(&self) -> Option<&[FrequentItemset]> {
        self.frequent.as_deref()
    }

    /// Frequent itemsets with no frequent strict superset.
    ///
    /// Leaves the stored itemsets untouched whether or not it succeeds.
    pub fn find_maximal_itemsets(&self) -> Result<Vec<FrequentItemset>> {
        let frequent = match &self.frequent {
            Some(f) if !f.is_empty() => f,
            _ => return Err(MiningError::NoFrequentItemsets),
        };
        Ok(frequent
            .iter()
            .filter(|candidate| {
                !frequent.iter().any(|other| {
                    other.items.len() > candidate.items.len()
                        && other.items.is_superset(&candidate.items)
                })
            })
            .cloned()
            .collect())
    }

    /// Rules from every non-trivial split of each itemset of size ≥ 2.
    ///
    /// Supports of the sides are looked up in `frequent`, which must hold
    /// every subset of the itemsets it contains (as a full discovery run
    /// does). Confidence is the ratio of transaction counts, so a rule
    /// exactly at `min_conf` is kept. Without `min_conf` every rule is kept.
    pub fn generate_rules(&mut self, frequent: &[FrequentItemset]) -> Result<&[AssociationRule]> {
        if frequent.is_empty() {
            return Err(MiningError::EmptyItemsets);
        }
        let min_conf = self.min_conf.unwrap_or(0.0);
        let known: HashMap<&Itemset, &FrequentItemset> = frequent.iter().map(|f| (&f.items, f)).collect();

        let mut rules = Vec::new();
        for itemset in frequent.iter().filter(|f| f.items.len() >= 2) {
            let items: Vec<&String> = itemset.items.iter().collect();
            let n = items.len();
            if n >= u64::BITS as usize {
                return Err(MiningError::invalid_dataset(format!(
                    "itemset of {} items is too large to split into rules",
                    n
                )));
            }
            // Bit i of `mask` puts items[i] in the antecedent.
            for mask in 1..(1u64 << n) - 1 {
                let mut antecedent = Itemset::new();
                let mut consequent = Itemset::new();
                for (i, item) in items.iter().enumerate() {
                    if (mask >> i) & 1 == 1 {
                        antecedent.insert((*item).clone());
                    } else {
                        consequent.insert((*item).clone());
                    }
                }

                let lhs = lookup(&known, &antecedent)?;
                let rhs = lookup(&known, &consequent)?;
                let confidence = itemset.count as f64 / lhs.count as f64;
                if confidence >= min_conf {
                    rules.push(AssociationRule {
                        antecedent_support: lhs.support,
                        consequent_support: rhs.support,
                        antecedent,
                        consequent,
                        support: itemset.support,
                        confidence,
                    });
                }
            }
        }

        info!(rules = rules.len(), min_conf, "association rules generated");
        self.rules = rules;
        Ok(self.rules.as_slice())
    }

    pub fn rules(&self) -> &[AssociationRule] {
        &self.rules
    }

    /// Drops transactions, itemsets and rules; parameters are kept.
    pub fn reset(&mut self) {
        self.transactions.clear();
        self.frequent = None;
        self.rules.clear();
    }
}

fn lookup<'a>(known: &HashMap<&Itemset, &'a FrequentItemset>, items: &Itemset) -> Result<&'a FrequentItemset> {
    known.get(items).copied().ok_or_else(|| {
        MiningError::invalid_dataset(format!(
            "support of {{{}}} is unknown; pass the complete frequent itemset list",
            join_items(items)
        ))
    })
}

fn to_itemset(matrix: &BinaryMatrix, columns: &[usize], count: usize) -> FrequentItemset {
    FrequentItemset {
        items: columns.iter().map(|&c| matrix.items[c].clone()).collect(),
        support: count as f64 / matrix.n_transactions() as f64,
        count,
    }
}

/// Anti-monotone pruning: every subset one item smaller must be frequent.
fn all_subsets_frequent(candidate: &[usize], frequent: &BTreeSet<&[usize]>) -> bool {
    (0..candidate.len()).all(|skip| {
        let subset: Vec<usize> = candidate
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, &c)| c)
            .collect();
        frequent.contains(subset.as_slice())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use approx::assert_abs_diff_eq;

    fn itemset(items: &[&str]) -> Itemset {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn basket_table() -> Result<Dataset> {
        Dataset::from_rows(
            ["ID", "items"],
            vec![
                row![1, "A"],
                row![1, "B"],
                row![2, "A"],
                row![2, "B"],
                row![2, "C"],
                row![3, "A"],
                row![4, "B"],
                row![4, "C"],
            ],
        )
    }

    fn mined(min_sup: f64, min_conf: Option<f64>) -> Result<Apriori> {
        let mut engine = Apriori::new();
        engine.set_params(min_sup, min_conf)?;
        let transactions = engine.prepare_transactions(&basket_table()?)?.to_vec();
        let matrix = engine.to_binary_matrix(&transactions);
        engine.find_frequent_itemsets(&matrix)?;
        Ok(engine)
    }

    #[test]
    fn validates_parameters() {
        let mut engine = Apriori::new();
        assert!(engine.set_params(0.0, None).is_err());
        assert!(engine.set_params(1.2, None).is_err());
        assert!(engine.set_params(f64::NAN, None).is_err());
        assert!(engine.set_params(0.5, Some(0.0)).is_err());
        assert!(engine.set_params(1.0, Some(1.0)).is_ok());
        assert_eq!(engine.min_conf(), Some(1.0));
    }

    #[test]
    fn groups_items_by_identifier() -> Result<()> {
        let mut engine = Apriori::new();
        let transactions = engine.prepare_transactions(&basket_table()?)?;
        assert_eq!(transactions.len(), 4);
        assert_eq!(transactions[1], vec!["A", "B", "C"]);

        let no_items = Dataset::from_rows(["ID", "product"], vec![row![1, "A"]])?;
        assert!(matches!(
            engine.prepare_transactions(&no_items),
            Err(MiningError::MissingColumns(_))
        ));
        Ok(())
    }

    #[test]
    fn binary_matrix_marks_membership() -> Result<()> {
        let engine = Apriori::new();
        let transactions = vec![
            vec!["milk".to_string(), "bread".to_string()],
            vec!["eggs".to_string(), "milk".to_string(), "milk".to_string()],
        ];
        let matrix = engine.to_binary_matrix(&transactions);
        assert_eq!(matrix.items, vec!["bread", "eggs", "milk"]);
        assert_eq!(matrix.transaction_ids, vec!["o1", "o2"]);
        assert_eq!(matrix.cells.row(0).to_vec(), vec![true, false, true]);
        assert_eq!(matrix.cells.row(1).to_vec(), vec![false, true, true]);
        Ok(())
    }

    #[test]
    fn finds_frequent_itemsets_at_threshold() -> Result<()> {
        let engine = mined(0.5, None)?;
        let found = engine.frequent_itemsets().unwrap();
        let summary: Vec<(Itemset, f64)> = found.iter().map(|f| (f.items.clone(), f.support)).collect();
        assert_eq!(
            summary,
            vec![
                (itemset(&["A"]), 0.75),
                (itemset(&["B"]), 0.75),
                (itemset(&["C"]), 0.5),
                (itemset(&["A", "B"]), 0.5),
                (itemset(&["B", "C"]), 0.5),
            ]
        );
        Ok(())
    }

    #[test]
    fn requires_min_sup_before_discovery() {
        let mut engine = Apriori::new();
        let matrix = engine.to_binary_matrix(&[vec!["A".to_string()]]);
        assert!(matches!(
            engine.find_frequent_itemsets(&matrix),
            Err(MiningError::InvalidParameter(_))
        ));
    }

    #[test]
    fn maximal_itemsets_exclude_subsets_only() -> Result<()> {
        let engine = mined(0.5, None)?;
        let maximal: Vec<Itemset> = engine
            .find_maximal_itemsets()?
            .into_iter()
            .map(|f| f.items)
            .collect();
        assert_eq!(maximal, vec![itemset(&["A", "B"]), itemset(&["B", "C"])]);
        Ok(())
    }

    #[test]
    fn maximal_requires_discovery() -> Result<()> {
        assert!(matches!(
            Apriori::new().find_maximal_itemsets(),
            Err(MiningError::NoFrequentItemsets)
        ));

        // Nothing reaches full support, and the failed call keeps state.
        let engine = mined(1.0, None)?;
        assert_eq!(engine.frequent_itemsets().map(<[_]>::len), Some(0));
        assert!(matches!(
            engine.find_maximal_itemsets(),
            Err(MiningError::NoFrequentItemsets)
        ));
        assert!(engine.frequent_itemsets().is_some());
        Ok(())
    }

    #[test]
    fn rules_respect_confidence() -> Result<()> {
        let mut engine = mined(0.5, Some(0.7))?;
        let frequent = engine.frequent_itemsets().unwrap().to_vec();
        let rules = engine.generate_rules(&frequent)?.to_vec();

        // A=>B 0.667, B=>A 0.667, B=>C 0.667, C=>B 1.0
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].antecedent, itemset(&["C"]));
        assert_eq!(rules[0].consequent, itemset(&["B"]));
        assert_abs_diff_eq!(rules[0].confidence, 1.0);
        assert_abs_diff_eq!(rules[0].antecedent_support, 0.5);
        assert_abs_diff_eq!(rules[0].consequent_support, 0.75);
        assert_eq!(
            rules[0].to_string(),
            "{C} => {B} (antecedent support=0.5, consequent support=0.75, support=0.5, confidence=1)"
        );

        engine.set_params(0.5, None)?;
        assert_eq!(engine.generate_rules(&frequent)?.len(), 4);
        Ok(())
    }

    #[test]
    fn rules_at_exactly_min_conf_are_kept() -> Result<()> {
        let transactions: Vec<Vec<String>> = [&["A", "B"][..], &["A", "B"], &["A", "B"], &["A"], &["B"]]
            .iter()
            .map(|t| t.iter().map(|s| s.to_string()).collect())
            .collect();
        let mut engine = Apriori::new();
        engine.set_params(0.2, Some(0.75))?;
        let matrix = engine.to_binary_matrix(&transactions);
        let frequent = engine.find_frequent_itemsets(&matrix)?.to_vec();
        assert_eq!(frequent.iter().map(|f| f.count).collect::<Vec<_>>(), vec![4, 4, 3]);

        // 3/4 in both directions; (3/5) / (4/5) would fall one ulp short.
        let rules = engine.generate_rules(&frequent)?;
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].antecedent, itemset(&["A"]));
        assert_eq!(rules[1].antecedent, itemset(&["B"]));
        assert!(rules.iter().all(|r| r.confidence == 0.75));
        Ok(())
    }

    #[test]
    fn oversized_itemsets_are_rejected() {
        let items: Itemset = (0..64).map(|i| format!("i{}", i)).collect();
        let huge = FrequentItemset {
            items,
            support: 1.0,
            count: 1,
        };
        let mut engine = Apriori::new();
        assert!(matches!(
            engine.generate_rules(&[huge]),
            Err(MiningError::InvalidDataset(_))
        ));
    }

    #[test]
    fn rules_need_itemsets() -> Result<()> {
        let mut engine = mined(0.5, Some(0.5))?;
        assert!(matches!(
            engine.generate_rules(&[]),
            Err(MiningError::EmptyItemsets)
        ));

        let maximal = engine.find_maximal_itemsets()?;
        assert!(matches!(
            engine.generate_rules(&maximal),
            Err(MiningError::InvalidDataset(_))
        ));
        Ok(())
    }

    #[test]
    fn reset_clears_session() -> Result<()> {
        let mut engine = mined(0.5, None)?;
        engine.reset();
        assert!(engine.transactions().is_empty());
        assert!(engine.frequent_itemsets().is_none());
        assert_eq!(engine.min_sup(), Some(0.5));
        Ok(())
    }
}
