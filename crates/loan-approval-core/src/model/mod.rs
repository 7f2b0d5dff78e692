//! Tabular classifier used as the cascade's fallback.
//!
//! Covers:
//! 1. **Preprocessing** -- standard scaling of the money columns, one-hot encoding of the categories.
//! 2. **Decision tree** -- CART with Gini impurity and a depth limit.
//! 3. **Pipeline** -- both stages plus metadata, persisted as a single JSON artifact.

pub mod pipeline;
pub mod preprocess;
pub mod tree;

pub use pipeline::{ModelMetadata, ModelPipeline};
pub use preprocess::Preprocessor;
pub use tree::{DecisionTreeClassifier, TreeParams};
