//! Errors
//!
//! Custom error types used throughout the `gbtsplit` crate.
use thiserror::Error;

/// Errors that can occur while searching for the best split of a node.
#[derive(Debug, Error)]
pub enum SplitError {
    /// Histogram shape does not agree with the feature's registered split edges.
    #[error("Feature {0} histogram has {1} bins, which is inconsistent with its {2} split edges.")]
    HistogramShape(usize, usize, usize),
    /// A histogram was supplied for a feature with no registered metadata.
    #[error("Feature {0} has a histogram, but no feature info is registered for it.")]
    UnknownFeature(usize),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
}
