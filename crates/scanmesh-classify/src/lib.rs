//! Semantic classes and the classification-buffer adapter.
#![forbid(unsafe_code)]

pub mod adapter;
pub mod class;

pub use adapter::{ClassifyError, FaceClasses, Granularity, RawClassification, normalize};
pub use class::{ParseClassError, SemanticClass};
