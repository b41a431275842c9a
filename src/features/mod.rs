pub mod builder;
pub mod encoding;

pub use builder::{build_features, FeatureSet};
pub use encoding::{encode, Applicant, FeatureVector, Research, UniversityRating};
