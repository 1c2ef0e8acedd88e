// src/lib.rs

//! `mining_rs` is a small data-mining toolkit: K-Means clustering, rough-set
//! approximations, ID3 decision trees, categorical Naive Bayes and Apriori
//! association rules, all over in-memory tables.

pub mod algorithms;
pub mod core;
pub mod traits;
pub mod utils;

// Re-export key components for easier use by library consumers
pub use crate::algorithms::{
    Apriori, AssociationRule, Correlation, DecisionTree, DiscernibilityMatrix, FrequentItemset, Id3, KMeans,
    KMeansConfig, KMeansResult, NaiveBayes, RoughSet, RoughSetReport, SplitMethod,
};
pub use crate::core::{Dataset, GraphDescription, IdSet, MiningError, Points, Result, Sample, Value, ID_COLUMN};
pub use crate::traits::{Classifier, ToGraph};
