// Modules
pub mod errors;
pub mod grad;
pub mod histogram;
pub mod params;
pub mod split;
pub mod splitter;
pub mod utils;

// Individual classes, and functions
pub use errors::SplitError;
pub use grad::{GradStats, MultiHess};
pub use histogram::{FeatureInfo, FeatureMeta, Histogram};
pub use params::GbdtParams;
pub use split::{GbtSplit, Side, SplitEntry, SplitPoint, SplitSet};
pub use splitter::SplitFinder;
