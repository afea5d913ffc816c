pub mod cache;
pub mod chart;
pub mod dataset;
pub mod document;
pub mod flatten;
pub mod infer;
pub mod load;
pub mod preview;
pub mod profile;
pub mod prompt;
pub mod scalar;
