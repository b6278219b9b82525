//! Orienta Classify — pure text logic: normalization, sector keyword
//! classification, bac-track and study-duration derivation.

pub mod bac;
pub mod classifier;
pub mod duration;
pub mod keywords;
pub mod normalize;

pub use bac::{classify_bac, BacProfile, BacType};
pub use classifier::{AmbiguityGate, Classifier, ClassifierConfig, ExclusionRule, KeywordRule, SecteurCatalog};
pub use duration::classify_duration;
