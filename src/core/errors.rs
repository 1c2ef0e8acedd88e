// src/core/errors.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MiningError {
    #[error("Invalid Parameter: {0}")]
    InvalidParameter(String),

    #[error("Missing Identifier: dataset has no '{0}' column")]
    MissingIdentifier(String),

    #[error("Missing Columns: dataset must contain {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Unknown Attribute: '{0}' is not a column of the dataset")]
    UnknownAttribute(String),

    #[error("Empty Dataset: {0}")]
    EmptyDataset(String),

    #[error("Invalid Dataset: {0}")]
    InvalidDataset(String),

    #[error("Empty Training Set: features and labels must both be non-empty")]
    EmptyTrainingSet,

    #[error("Size Mismatch: {left} rows against {right} rows")]
    SizeMismatch { left: usize, right: usize },

    #[error("Empty Itemsets: cannot generate rules from an empty itemset collection")]
    EmptyItemsets,

    #[error("No Frequent Itemsets: run frequent itemset discovery first")]
    NoFrequentItemsets,

    #[error("Model Not Trained: call fit() before predicting")]
    ModelNotTrained,

    #[error("No Matching Branch: attribute '{attribute}' has no branch for value '{value}'")]
    NoMatchingBranch { attribute: String, value: String },

    #[error("Parse Error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Ndarray Error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl MiningError {
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn invalid_dataset(msg: impl Into<String>) -> Self {
        Self::InvalidDataset(msg.into())
    }

    pub fn unknown_attribute(name: impl Into<String>) -> Self {
        Self::UnknownAttribute(name.into())
    }
}

// Convenience type alias for Result
pub type Result<T> = std::result::Result<T, MiningError>;
