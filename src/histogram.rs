//! Histogram
//!
//! Read-only per-feature histograms of gradient statistics, plus the feature
//! metadata registry consulted during split finding. Histograms are built
//! and owned by the histogram construction subsystem; the split search only
//! ever reads them.
use crate::grad::GradStats;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Aggregated gradient statistics for one feature at one node, one entry
/// per discretized bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    bins: Vec<GradStats>,
}

impl Histogram {
    pub fn new(bins: Vec<GradStats>) -> Self {
        Histogram { bins }
    }

    /// Number of buckets.
    pub fn num_bin(&self) -> usize {
        self.bins.len()
    }

    /// Statistics of bucket `i`.
    pub fn get(&self, i: usize) -> &GradStats {
        &self.bins[i]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GradStats> {
        self.bins.iter()
    }
}

/// Metadata for a single feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMeta {
    /// Whether the feature's buckets are unordered categories.
    pub is_categorical: bool,
    /// Ordered bin edges. Continuous features carry `num_bin + 1` edges with
    /// infinite outer sentinels; categorical features carry one value per
    /// bucket.
    pub splits: Vec<f32>,
    /// Bucket receiving missing and sparse values.
    pub default_bin: usize,
}

impl FeatureMeta {
    /// Number of buckets implied by the split edges.
    pub fn num_bin(&self) -> usize {
        if self.is_categorical {
            self.splits.len()
        } else {
            self.splits.len() - 1
        }
    }
}

/// Registry of feature metadata, keyed by feature id. Static for a training
/// run, read-only during search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureInfo {
    features: HashMap<usize, FeatureMeta>,
}

impl FeatureInfo {
    pub fn new() -> Self {
        FeatureInfo::default()
    }

    /// Register a continuous feature from its ordered bin edges.
    pub fn insert_continuous(&mut self, fid: usize, splits: Vec<f32>, default_bin: usize) {
        self.features.insert(
            fid,
            FeatureMeta {
                is_categorical: false,
                splits,
                default_bin,
            },
        );
    }

    /// Register a categorical feature from its per-bucket category values.
    pub fn insert_categorical(&mut self, fid: usize, splits: Vec<f32>, default_bin: usize) {
        self.features.insert(
            fid,
            FeatureMeta {
                is_categorical: true,
                splits,
                default_bin,
            },
        );
    }

    pub fn get(&self, fid: usize) -> Option<&FeatureMeta> {
        self.features.get(&fid)
    }
}
