//! Analysis result aggregation
//!
//! Combines the analyzer ratings into a force vector and compares vectors:
//! - Result types (force vector, classification, full analysis)
//! - Distance and cosine similarity

pub mod distance;
pub mod result;

pub use distance::{cosine_similarity, distance};
pub use result::{Analysis, Classification, ForceVector};
