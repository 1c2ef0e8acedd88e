pub mod apriori;
pub mod correlation;
pub mod discernibility;
pub mod id3;
pub mod kmeans;
pub mod naive_bayes;
pub mod rough_sets;

pub use apriori::{Apriori, AssociationRule, BinaryMatrix, FrequentItemset, Itemset, ITEMS_COLUMN};
pub use correlation::{Correlation, CorrelationSummary, Direction};
pub use discernibility::DiscernibilityMatrix;
pub use id3::{DecisionRule, DecisionTree, Id3, SplitMethod};
pub use kmeans::{KMeans, KMeansConfig, KMeansResult};
pub use naive_bayes::NaiveBayes;
pub use rough_sets::{RoughSet, RoughSetReport};
