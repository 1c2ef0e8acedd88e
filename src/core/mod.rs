pub mod data;
pub mod errors;
pub mod graph;

pub use data::*; // Re-export common data types
pub use errors::*;
pub use graph::*;
